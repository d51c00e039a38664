//! 单次批量运行的共享计数器
//!
//! 每次 `BatchProcessor::run` 新建一份，通过 `Arc` 分发给所有任务，
//! 不同批次之间互不影响

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RunStatistics {
    call_count: AtomicUsize,
    error_count: AtomicUsize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功的模型调用
    pub fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次最终失败
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }
}
