//! 解题流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 确定策略（自适应选择 / 固定策略）
//! 2. 运行策略（调用模型、提取答案、投票）
//! 3. 返回 `SolveOutcome`

use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::ChatModel;
use crate::models::{Question, RunStatistics, SolveOutcome};
use crate::services::strategy_selector;
use crate::services::Strategy;
use crate::utils::logging::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 策略确定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    /// 每道题由关键词选择器决定
    Adaptive,
    /// 整个批次使用同一种策略
    Fixed(Strategy),
}

impl StrategyMode {
    /// 显式指定的策略优先；否则按是否自适应决定，关闭自适应时退回直接回答
    pub fn resolve(use_adaptive: bool, forced: Option<Strategy>) -> Self {
        match forced {
            Some(strategy) => StrategyMode::Fixed(strategy),
            None if use_adaptive => StrategyMode::Adaptive,
            None => StrategyMode::Fixed(Strategy::Direct),
        }
    }

    pub fn strategy_for(self, question: &Question) -> Strategy {
        match self {
            StrategyMode::Adaptive => strategy_selector::select(&question.input, &question.domain),
            StrategyMode::Fixed(strategy) => strategy,
        }
    }
}

/// 解题流程
///
/// - 不持有批次状态，只持有共享的客户端和计数器
/// - 可以被多个任务同时使用
pub struct SolveFlow<C: ChatModel + ?Sized> {
    client: Arc<C>,
    stats: Arc<RunStatistics>,
    mode: StrategyMode,
}

impl<C: ChatModel + ?Sized> Clone for SolveFlow<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            stats: self.stats.clone(),
            mode: self.mode,
        }
    }
}

impl<C: ChatModel + ?Sized> SolveFlow<C> {
    pub fn new(client: Arc<C>, stats: Arc<RunStatistics>, mode: StrategyMode) -> Self {
        Self {
            client,
            stats,
            mode,
        }
    }

    pub async fn run(&self, question: &Question, ctx: &QuestionCtx) -> SolveOutcome {
        let strategy = self.mode.strategy_for(question);
        debug!(
            "{} 策略: {} | 题干: {}",
            ctx,
            strategy,
            truncate_text(&question.input, 80)
        );

        let outcome = strategy
            .solve(self.client.as_ref(), &self.stats, &question.input, &question.domain)
            .await;

        match &outcome.error_message {
            Some(message) => warn!("{} ⚠️ {} 策略失败: {}", ctx, strategy, message),
            None => debug!("{} ✓ 答案: {}", ctx, truncate_text(&outcome.answer, 80)),
        }

        outcome
    }
}
