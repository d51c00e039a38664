//! 解题策略 - 业务能力层
//!
//! 三种策略共用同一个模型客户端和答案提取器，区别只在提示词、采样温度和结果归并方式：
//!
//! | 策略 | 调用次数 | 温度 | 超时 |
//! |------|----------|------|------|
//! | `Direct` | 1 | 0.0 | 30s |
//! | `ChainOfThought` | 1 | 0.0 | 45s |
//! | `SelfConsistency` | 3 | 0.7 | 每次 30s |
//!
//! 策略本身不重试。

use crate::clients::ChatModel;
use crate::models::{RunStatistics, SolveOutcome, UNKNOWN_DOMAIN};
use crate::services::answer_extractor::{extract, extract_reasoning};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// 自洽投票的采样次数
pub const SELF_CONSISTENCY_SAMPLES: usize = 3;

/// 自洽投票全部失败时的错误信息
pub const ALL_ATTEMPTS_FAILED: &str = "All attempts failed";

const DIRECT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Reply with only the final answer, \
no explanation. Always give the complete answer.";

const CHAIN_OF_THOUGHT_SYSTEM_PROMPT: &str = "You are a careful problem solver. Reason step by step, \
then give the result on its own last line in the form 'Final answer: <answer>'.";

const STEP_BY_STEP_SUFFIX: &str = "Let's think step by step.";

/// 解题策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// 一次调用，只要答案
    Direct,
    /// 一次调用，先推理再给结论
    ChainOfThought,
    /// 多次采样后多数投票
    SelfConsistency,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::ChainOfThought => "cot",
            Strategy::SelfConsistency => "self_consistency",
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            Strategy::Direct | Strategy::ChainOfThought => 0.0,
            Strategy::SelfConsistency => 0.7,
        }
    }

    /// 单次模型调用的超时时间
    pub fn call_timeout(self) -> Duration {
        match self {
            Strategy::ChainOfThought => Duration::from_secs(45),
            Strategy::Direct | Strategy::SelfConsistency => Duration::from_secs(30),
        }
    }

    fn system_prompt(self, domain: &str) -> String {
        let base = match self {
            Strategy::ChainOfThought => CHAIN_OF_THOUGHT_SYSTEM_PROMPT,
            Strategy::Direct | Strategy::SelfConsistency => DIRECT_SYSTEM_PROMPT,
        };
        if domain.is_empty() || domain == UNKNOWN_DOMAIN {
            base.to_string()
        } else {
            format!("{} The question belongs to the {} domain.", base, domain)
        }
    }

    fn user_prompt(self, question: &str) -> String {
        match self {
            Strategy::ChainOfThought => format!("{}\n\n{}", question, STEP_BY_STEP_SUFFIX),
            Strategy::Direct | Strategy::SelfConsistency => question.to_string(),
        }
    }

    /// 用当前策略解答一道题
    ///
    /// 每次成功的模型调用记一次 `call_count`；策略最终失败时记一次 `error_count`
    pub async fn solve<C>(
        self,
        client: &C,
        stats: &RunStatistics,
        question: &str,
        domain: &str,
    ) -> SolveOutcome
    where
        C: ChatModel + ?Sized,
    {
        let system_prompt = self.system_prompt(domain);
        let user_prompt = self.user_prompt(question);

        match self {
            Strategy::Direct => {
                self.solve_once(client, stats, &user_prompt, &system_prompt, extract)
                    .await
            }
            Strategy::ChainOfThought => {
                self.solve_once(client, stats, &user_prompt, &system_prompt, extract_reasoning)
                    .await
            }
            Strategy::SelfConsistency => {
                self.solve_by_vote(client, stats, &user_prompt, &system_prompt)
                    .await
            }
        }
    }

    async fn solve_once<C>(
        self,
        client: &C,
        stats: &RunStatistics,
        user_prompt: &str,
        system_prompt: &str,
        extractor: fn(&str) -> String,
    ) -> SolveOutcome
    where
        C: ChatModel + ?Sized,
    {
        let result = client
            .call(user_prompt, system_prompt, self.temperature(), self.call_timeout())
            .await;

        if result.ok {
            stats.record_call();
            SolveOutcome::success(extractor(result.text.as_deref().unwrap_or_default()))
        } else {
            stats.record_error();
            SolveOutcome::failure(result.error_summary())
        }
    }

    async fn solve_by_vote<C>(
        self,
        client: &C,
        stats: &RunStatistics,
        user_prompt: &str,
        system_prompt: &str,
    ) -> SolveOutcome
    where
        C: ChatModel + ?Sized,
    {
        let mut answers = Vec::with_capacity(SELF_CONSISTENCY_SAMPLES);

        // 顺序采样，保证一个任务同一时刻只占用一次在途调用
        for attempt in 1..=SELF_CONSISTENCY_SAMPLES {
            let result = client
                .call(user_prompt, system_prompt, self.temperature(), self.call_timeout())
                .await;

            // call_count 只统计成功的采样，失败的采样不计入
            if result.ok {
                stats.record_call();
                answers.push(extract(result.text.as_deref().unwrap_or_default()));
            } else {
                debug!(
                    "自洽采样 {}/{} 失败: {}",
                    attempt,
                    SELF_CONSISTENCY_SAMPLES,
                    result.error_summary()
                );
            }
        }

        match majority_vote(&answers) {
            Some(answer) => SolveOutcome::success(answer),
            None => {
                stats.record_error();
                SolveOutcome::failure(ALL_ATTEMPTS_FAILED)
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Strategy::Direct),
            "cot" | "chain_of_thought" => Ok(Strategy::ChainOfThought),
            "self_consistency" | "sc" => Ok(Strategy::SelfConsistency),
            other => Err(format!(
                "未知策略 '{}'，可选: direct | cot | self_consistency",
                other
            )),
        }
    }
}

/// 多数投票
///
/// 按 "去首尾空白 + 小写" 归一化后计票；票数相同时取最先出现的那一组，
/// 返回该组第一次出现时去掉首尾空白后的写法（保留大小写）。空答案只在没有其他答案时参与投票。
/// 输入为空时返回 None。
pub fn majority_vote(answers: &[String]) -> Option<String> {
    let non_empty: Vec<&String> = answers.iter().filter(|a| !a.trim().is_empty()).collect();
    let candidates: Vec<&String> = if non_empty.is_empty() {
        answers.iter().collect()
    } else {
        non_empty
    };

    // (归一化键, 票数, 首次出现的原文)，保持首次出现顺序
    let mut groups: Vec<(String, usize, &str)> = Vec::new();
    for answer in candidates {
        let key = answer.trim().to_lowercase();
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some(group) => group.1 += 1,
            None => groups.push((key, 1, answer.trim())),
        }
    }

    let mut best: Option<&(String, usize, &str)> = None;
    for group in &groups {
        if best.map_or(true, |b| group.1 > b.1) {
            best = Some(group);
        }
    }
    best.map(|(_, _, original)| original.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ModelCallResult;
    use crate::error::ModelErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按顺序返回预设结果，并记录收到的请求
    struct ScriptedModel {
        replies: Mutex<VecDeque<ModelCallResult>>,
        seen: Mutex<Vec<(String, String, f32, Duration)>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<ModelCallResult>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn call(
            &self,
            prompt: &str,
            system_prompt: &str,
            temperature: f32,
            timeout: Duration,
        ) -> ModelCallResult {
            self.seen.lock().unwrap().push((
                prompt.to_string(),
                system_prompt.to_string(),
                temperature,
                timeout,
            ));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ModelCallResult::failure(ModelErrorKind::Connection, None, "exhausted"))
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_majority_vote_case_insensitive_keeps_first_spelling() {
        assert_eq!(
            majority_vote(&strings(&["Paris", "paris", "London"])),
            Some("Paris".to_string())
        );
        assert_eq!(
            majority_vote(&strings(&["  Paris ", "paris"])),
            Some("Paris".to_string())
        );
    }

    #[test]
    fn test_majority_vote_tie_uses_first_seen() {
        assert_eq!(
            majority_vote(&strings(&["B", "A", "a", "b"])),
            Some("B".to_string())
        );
        assert_eq!(majority_vote(&strings(&["x", "y", "z"])), Some("x".to_string()));
    }

    #[test]
    fn test_majority_vote_ignores_empty_unless_only_option() {
        assert_eq!(majority_vote(&strings(&["", "", "42"])), Some("42".to_string()));
        assert_eq!(majority_vote(&strings(&["", ""])), Some(String::new()));
        assert_eq!(majority_vote(&[]), None);
    }

    #[tokio::test]
    async fn test_direct_success_counts_one_call() {
        let model = ScriptedModel::new(vec![ModelCallResult::success("Answer: 4")]);
        let stats = RunStatistics::new();

        let outcome = Strategy::Direct.solve(&model, &stats, "What is 2+2?", "unknown").await;

        assert_eq!(outcome, SolveOutcome::success("4"));
        assert_eq!(stats.call_count(), 1);
        assert_eq!(stats.error_count(), 0);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].0, "What is 2+2?");
        assert_eq!(seen[0].2, 0.0);
        assert_eq!(seen[0].3, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_direct_failure_propagates_error() {
        let model = ScriptedModel::new(vec![ModelCallResult::failure(
            ModelErrorKind::Http,
            Some(500),
            "server exploded",
        )]);
        let stats = RunStatistics::new();

        let outcome = Strategy::Direct.solve(&model, &stats, "q", "unknown").await;

        assert_eq!(outcome.answer, "");
        assert_eq!(outcome.error_message.as_deref(), Some("HTTP 500: server exploded"));
        assert_eq!(stats.call_count(), 0);
        assert_eq!(stats.error_count(), 1);
    }

    #[tokio::test]
    async fn test_chain_of_thought_prompt_and_extraction() {
        let model = ScriptedModel::new(vec![ModelCallResult::success(
            "Ice has lower density than water.\nTherefore, it floats.",
        )]);
        let stats = RunStatistics::new();

        let outcome = Strategy::ChainOfThought
            .solve(&model, &stats, "Why does ice float?", "physics")
            .await;

        assert_eq!(outcome.answer, "it floats");
        let seen = model.seen.lock().unwrap();
        assert!(seen[0].0.ends_with("Let's think step by step."));
        assert!(seen[0].1.contains("physics"));
        assert_eq!(seen[0].3, Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_self_consistency_votes_over_successes() {
        let model = ScriptedModel::new(vec![
            ModelCallResult::success("Paris"),
            ModelCallResult::failure(ModelErrorKind::Timeout, None, "elapsed"),
            ModelCallResult::success("paris"),
        ]);
        let stats = RunStatistics::new();

        let outcome = Strategy::SelfConsistency
            .solve(&model, &stats, "Which city is the capital of France?", "unknown")
            .await;

        assert_eq!(outcome, SolveOutcome::success("Paris"));
        assert_eq!(stats.call_count(), 2);
        assert_eq!(stats.error_count(), 0);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), SELF_CONSISTENCY_SAMPLES);
        assert!(seen.iter().all(|s| s.2 == 0.7));
    }

    #[tokio::test]
    async fn test_self_consistency_exhaustion_counts_one_error() {
        let model = ScriptedModel::new(vec![]);
        let stats = RunStatistics::new();

        let outcome = Strategy::SelfConsistency
            .solve(&model, &stats, "Estimate pi", "unknown")
            .await;

        assert_eq!(outcome.answer, "");
        assert_eq!(outcome.error_message.as_deref(), Some(ALL_ATTEMPTS_FAILED));
        assert_eq!(stats.error_count(), 1);
        assert_eq!(stats.call_count(), 0);
    }

    #[test]
    fn test_strategy_from_str_round_trip() {
        for strategy in [Strategy::Direct, Strategy::ChainOfThought, Strategy::SelfConsistency] {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
        assert!("fastest".parse::<Strategy>().is_err());
    }
}
