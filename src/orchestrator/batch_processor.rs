//! 批量解题处理器 - 编排层
//!
//! ## 职责
//!
//! 接收一批题目，产出与输入顺序一致的答案列表。
//!
//! ## 核心流程
//!
//! 1. **预检**：同步解答第一道题；失败则直接中止整个批次（不产出任何结果）
//! 2. **分发**：每道题一个 `tokio::spawn` 任务，`Semaphore` 限制同时在途的任务数
//! 3. **收集**：按完成顺序收集，写入按下标预分配的结果槽位；任务 panic 也会被转换为空答案
//! 4. **进度**：每 100 道或每 5 秒输出一次进度
//! 5. **汇总**：输出耗时、调用数、错误数和前几条错误样例
//!
//! ## 设计特点
//!
//! - 单道题失败只影响自己的槽位，不影响其他任务；只有预检失败会中止批次
//! - 计数器随每次 `run` 新建，不同批次互不干扰
//! - 所有任务都挂在批次级 `CancellationToken` 上，可由截止时间或调用方取消

use crate::clients::ChatModel;
use crate::config::Config;
use crate::error::BatchAborted;
use crate::models::{AnswerRecord, Question, RunStatistics, SolveOutcome, TaskError};
use crate::orchestrator::progress::ProgressTracker;
use crate::utils::logging;
use crate::workflow::{QuestionCtx, SolveFlow, StrategyMode};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 批次被取消时写入的错误信息
pub const CANCELLED_MESSAGE: &str = "batch cancelled before completion";

/// 批次完成后的汇总结果
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// 与输入顺序一致，长度等于题目数
    pub records: Vec<AnswerRecord>,
    /// 按完成顺序记录的 (下标, 错误)
    pub errors: Vec<TaskError>,
    pub call_count: usize,
    pub error_count: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.output.as_str())
    }
}

/// 单个任务的结束方式
enum TaskOutcome {
    Finished(SolveOutcome),
    Cancelled,
}

/// 批量处理器
pub struct BatchProcessor<C: ChatModel + ?Sized> {
    client: Arc<C>,
    worker_limit: usize,
    mode: StrategyMode,
    batch_timeout: Option<Duration>,
}

impl<C> BatchProcessor<C>
where
    C: ChatModel + ?Sized + 'static,
{
    pub fn new(client: Arc<C>, config: &Config) -> Self {
        Self {
            client,
            worker_limit: config.max_workers.max(1),
            mode: StrategyMode::resolve(config.use_adaptive, None),
            batch_timeout: config.batch_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn with_worker_limit(mut self, worker_limit: usize) -> Self {
        self.worker_limit = worker_limit.max(1);
        self
    }

    pub fn with_mode(mut self, mode: StrategyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// 处理一批题目，不接受外部取消
    pub async fn run(&self, questions: Vec<Question>) -> Result<BatchReport, BatchAborted> {
        self.run_until_cancelled(questions, CancellationToken::new())
            .await
    }

    /// 处理一批题目，`cancel` 只作用于本次运行（例如 Ctrl-C）
    ///
    /// # 返回
    /// - `Ok(BatchReport)`：所有题目都有结果（失败或被取消的题目答案为空字符串）
    /// - `Err(BatchAborted)`：预检失败或预检期间被取消，没有任何结果
    pub async fn run_until_cancelled(
        &self,
        questions: Vec<Question>,
        cancel: CancellationToken,
    ) -> Result<BatchReport, BatchAborted> {
        let started = Instant::now();
        let total = questions.len();
        let stats = Arc::new(RunStatistics::new());
        let flow = SolveFlow::new(self.client.clone(), stats.clone(), self.mode);

        logging::log_batch_start(total, self.worker_limit, self.mode);

        if let Some(first) = questions.first() {
            self.smoke_test(&flow, first, &cancel).await?;
        }

        let batch_token = cancel.child_token();
        let deadline = self.batch_timeout.map(|timeout| {
            let token = batch_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!("⏰ 批次超过截止时间 {:?}，取消剩余任务", timeout);
                token.cancel();
            })
        });

        let ids: Vec<String> = questions
            .iter()
            .enumerate()
            .map(|(index, q)| q.resolved_id(index))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.worker_limit));
        let mut pending = FuturesUnordered::new();

        // 为每道题创建并发任务
        for (index, question) in questions.into_iter().enumerate() {
            let ctx = QuestionCtx::new(index, &question);
            let flow = flow.clone();
            let semaphore = semaphore.clone();
            let token = batch_token.clone();

            let handle = tokio::spawn(async move {
                let work = async {
                    match semaphore.acquire_owned().await {
                        Ok(_permit) => flow.run(&question, &ctx).await,
                        Err(e) => SolveOutcome::failure(format!("worker pool closed: {}", e)),
                    }
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => TaskOutcome::Cancelled,
                    outcome = work => TaskOutcome::Finished(outcome),
                }
            });
            pending.push(async move { (index, handle.await) });
        }

        // 按完成顺序收集，写入对应下标的槽位
        let mut slots: Vec<Option<String>> = vec![None; total];
        let mut errors = Vec::new();
        let mut progress = ProgressTracker::new(total);

        while let Some((index, joined)) = pending.next().await {
            let output = match joined {
                Ok(TaskOutcome::Finished(outcome)) => {
                    if let Some(message) = outcome.error_message {
                        errors.push(TaskError { index, message });
                    }
                    outcome.answer
                }
                Ok(TaskOutcome::Cancelled) => {
                    stats.record_error();
                    errors.push(TaskError {
                        index,
                        message: CANCELLED_MESSAGE.to_string(),
                    });
                    String::new()
                }
                Err(e) => {
                    stats.record_error();
                    error!("[题目 {}] 任务执行失败: {}", index, e);
                    errors.push(TaskError {
                        index,
                        message: format!("task failed: {}", e),
                    });
                    String::new()
                }
            };
            slots[index] = Some(output);

            if let Some(snapshot) = progress.record_completion(stats.error_count()) {
                info!("{}", snapshot);
            }
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let records = ids
            .into_iter()
            .zip(slots)
            .map(|(id, slot)| AnswerRecord {
                id,
                output: slot.unwrap_or_default(),
            })
            .collect();

        let report = BatchReport {
            records,
            errors,
            call_count: stats.call_count(),
            error_count: stats.error_count(),
            elapsed: started.elapsed(),
        };
        logging::print_final_stats(&report);

        Ok(report)
    }

    /// 预检：同步解答第一道题
    async fn smoke_test(
        &self,
        flow: &SolveFlow<C>,
        first: &Question,
        cancel: &CancellationToken,
    ) -> Result<(), BatchAborted> {
        let ctx = QuestionCtx::new(0, first);
        info!("🧪 预检: 同步解答第一道题 {}", ctx);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("🛑 预检期间收到取消，批次中止");
                return Err(BatchAborted::Cancelled);
            }
            outcome = flow.run(first, &ctx) => outcome,
        };

        match outcome.error_message {
            None => {
                info!(
                    "✓ 预检通过，答案: {}",
                    logging::truncate_text(&outcome.answer, 80)
                );
                Ok(())
            }
            Some(reason) => {
                error!("❌ 预检失败，批次中止: {}", reason);
                Err(BatchAborted::SmokeTestFailed {
                    question_id: ctx.id,
                    reason,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ModelCallResult;
    use crate::error::ModelErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 回显题目文本的模型，并统计同时在途的调用数
    #[derive(Default)]
    struct EchoModel {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn call(
            &self,
            prompt: &str,
            _system_prompt: &str,
            _temperature: f32,
            _timeout: Duration,
        ) -> ModelCallResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            // 让后面的题目更早完成，打乱完成顺序
            let delay = prompt
                .trim_start_matches('q')
                .parse::<u64>()
                .map(|n| 30u64.saturating_sub(n))
                .unwrap_or(1);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if prompt.contains("fail") {
                ModelCallResult::failure(ModelErrorKind::Http, Some(500), "boom")
            } else if prompt.contains("panic") {
                panic!("model exploded");
            } else {
                ModelCallResult::success(format!("Final answer: {}", prompt))
            }
        }
    }

    /// 永远不返回的模型
    struct HangingModel;

    #[async_trait]
    impl ChatModel for HangingModel {
        async fn call(
            &self,
            prompt: &str,
            _system_prompt: &str,
            _temperature: f32,
            _timeout: Duration,
        ) -> ModelCallResult {
            if prompt == "q0" {
                return ModelCallResult::success("ok");
            }
            futures::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn direct_processor<C: ChatModel + ?Sized + 'static>(client: Arc<C>, workers: usize) -> BatchProcessor<C> {
        BatchProcessor::new(client, &Config::default())
            .with_worker_limit(workers)
            .with_mode(StrategyMode::Fixed(crate::services::Strategy::Direct))
    }

    fn numbered_questions(n: usize) -> Vec<Question> {
        (0..n).map(|i| Question::new(format!("q{}", i))).collect()
    }

    #[tokio::test]
    async fn test_order_preserved_regardless_of_completion_order() {
        let model = Arc::new(EchoModel::default());
        let processor = direct_processor(model.clone(), 8);

        let report = processor.run(numbered_questions(25)).await.unwrap();

        assert_eq!(report.records.len(), 25);
        for (i, record) in report.records.iter().enumerate() {
            assert_eq!(record.id, i.to_string());
            assert_eq!(record.output, format!("q{}", i));
        }
        assert!(report.errors.is_empty());
        // 预检 1 次 + 每道题 1 次
        assert_eq!(report.call_count, 26);
    }

    #[tokio::test]
    async fn test_worker_limit_bounds_in_flight_calls() {
        let model = Arc::new(EchoModel::default());
        let processor = direct_processor(model.clone(), 3);

        processor.run(numbered_questions(30)).await.unwrap();

        let max = model.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "max in flight was {}", max);
        assert!(max >= 1);
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let model = Arc::new(EchoModel::default());
        let processor = direct_processor(model, 4);
        let questions = vec![
            Question::new("q0"),
            Question::new("please fail").with_id("x"),
            Question::new("q2"),
            Question::new("panic now"),
        ];

        let report = processor.run(questions).await.unwrap();

        assert_eq!(report.records.len(), 4);
        assert_eq!(report.records[1].id, "x");
        assert_eq!(report.records[1].output, "");
        assert_eq!(report.records[3].output, "");
        assert_eq!(report.records[2].output, "q2");
        assert_eq!(report.error_count, 2);

        let mut failed: Vec<usize> = report.errors.iter().map(|e| e.index).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_smoke_test_failure_aborts_batch() {
        let model = Arc::new(EchoModel::default());
        let processor = direct_processor(model.clone(), 4);
        let mut questions = numbered_questions(10);
        questions[0] = Question::new("fail first").with_id("first");

        let aborted = processor.run(questions).await.unwrap_err();

        match aborted {
            BatchAborted::SmokeTestFailed { question_id, reason } => {
                assert_eq!(question_id, "first");
                assert!(reason.contains("HTTP 500"));
            }
            other => panic!("unexpected abort: {:?}", other),
        }
        // 只发生了预检调用
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty_report() {
        let model = Arc::new(EchoModel::default());
        let processor = direct_processor(model.clone(), 4);

        let report = processor.run(Vec::new()).await.unwrap();

        assert!(report.records.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_deadline_cancels_hung_tasks() {
        let processor = direct_processor(Arc::new(HangingModel), 2)
            .with_batch_timeout(Some(Duration::from_millis(50)));

        let report = processor.run(numbered_questions(5)).await.unwrap();

        assert_eq!(report.records.len(), 5);
        assert_eq!(report.records[0].output, "ok");
        for record in &report.records[1..] {
            assert_eq!(record.output, "");
        }
        assert_eq!(report.error_count, 4);
        assert!(report.errors.iter().all(|e| e.message == CANCELLED_MESSAGE));
    }

    #[tokio::test]
    async fn test_external_cancellation() {
        let processor = direct_processor(Arc::new(HangingModel), 2);
        let token = CancellationToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let report = processor
            .run_until_cancelled(numbered_questions(3), token)
            .await
            .unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_does_not_poison_next_batch() {
        let model = Arc::new(EchoModel::default());
        let processor = direct_processor(model.clone(), 4);

        let token = CancellationToken::new();
        token.cancel();
        let aborted = processor
            .run_until_cancelled(numbered_questions(5), token)
            .await
            .unwrap_err();
        assert_eq!(aborted, BatchAborted::Cancelled);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        let report = processor.run(numbered_questions(5)).await.unwrap();
        assert_eq!(report.records.len(), 5);
        assert!(report.errors.is_empty());
        assert_eq!(report.records[4].output, "q4");
    }

    /// 记录每次调用的用户消息和温度
    #[derive(Default)]
    struct RecordingModel {
        seen: std::sync::Mutex<Vec<(String, f32)>>,
    }

    impl RecordingModel {
        fn calls_for(&self, question: &str) -> Vec<(String, f32)> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|(prompt, _)| prompt.starts_with(question))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn call(
            &self,
            prompt: &str,
            _system_prompt: &str,
            temperature: f32,
            _timeout: Duration,
        ) -> ModelCallResult {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), temperature));
            ModelCallResult::success("Final answer: ok")
        }
    }

    const WHY: &str = "Why does ice float?";
    const WHICH: &str = "Which option is optimal?";
    const PLAIN: &str = "What is 2+2?";

    fn mixed_questions() -> Vec<Question> {
        vec![Question::new(WHY), Question::new(WHICH), Question::new(PLAIN)]
    }

    #[tokio::test]
    async fn test_adaptive_mode_selects_strategy_per_question() {
        let model = Arc::new(RecordingModel::default());
        let processor = BatchProcessor::new(model.clone(), &Config::default()).with_worker_limit(2);

        let report = processor.run(mixed_questions()).await.unwrap();
        assert_eq!(report.outputs().collect::<Vec<_>>(), vec!["ok", "ok", "ok"]);

        // 预检和工作池各解一次第一道题，都走思维链
        let why = model.calls_for(WHY);
        assert_eq!(why.len(), 2);
        assert!(why
            .iter()
            .all(|(prompt, t)| prompt.ends_with("Let's think step by step.") && *t == 0.0));

        let which = model.calls_for(WHICH);
        assert_eq!(which.len(), 3);
        assert!(which.iter().all(|(prompt, t)| prompt == WHICH && *t == 0.7));

        let plain = model.calls_for(PLAIN);
        assert_eq!(plain, vec![(PLAIN.to_string(), 0.0)]);

        assert_eq!(report.call_count, 6);
    }

    #[tokio::test]
    async fn test_adaptive_off_falls_back_to_direct() {
        let model = Arc::new(RecordingModel::default());
        let config = Config {
            use_adaptive: false,
            ..Config::default()
        };
        let processor = BatchProcessor::new(model.clone(), &config);

        processor.run(mixed_questions()).await.unwrap();

        for question in [WHY, WHICH, PLAIN] {
            let calls = model.calls_for(question);
            let expected_len = if question == WHY { 2 } else { 1 };
            assert_eq!(calls.len(), expected_len, "{}", question);
            assert!(calls.iter().all(|(prompt, t)| prompt == question && *t == 0.0));
        }
    }
}
