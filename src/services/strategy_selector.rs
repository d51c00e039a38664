//! 策略选择 - 业务能力层
//!
//! 纯函数：只看题面关键词，不看历史，不做 I/O

use crate::services::strategy::Strategy;

/// 需要逐步推理的题目
const CHAIN_OF_THOUGHT_KEYWORDS: [&str; 5] = ["why", "explain", "how", "calculate", "prove"];

/// 答案不唯一、适合多次采样投票的题目
const SELF_CONSISTENCY_KEYWORDS: [&str; 5] = ["estimate", "approximately", "which", "best", "optimal"];

/// 根据题面选择解题策略
///
/// 规则按固定优先级检查，先命中者生效：思维链 > 自洽投票 > 直接回答。
/// `domain` 目前不参与判断。
pub fn select(question: &str, _domain: &str) -> Strategy {
    let lowered = question.to_lowercase();

    if CHAIN_OF_THOUGHT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Strategy::ChainOfThought
    } else if SELF_CONSISTENCY_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Strategy::SelfConsistency
    } else {
        Strategy::Direct
    }
}
