//! 批次进度跟踪
//!
//! 每完成 100 道题或距离上次输出超过 5 秒时输出一行进度

use std::fmt;
use std::time::{Duration, Instant};

/// 按完成数量触发的输出间隔
pub const REPORT_EVERY: usize = 100;

/// 按时间触发的输出间隔
pub const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// 一次进度输出的内容
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub errors: usize,
}

impl ProgressSnapshot {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }

    /// 每秒完成的题目数
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.completed as f64 / secs
        }
    }

    /// 按当前吞吐估算的剩余时间
    pub fn eta(&self) -> Option<Duration> {
        let rate = self.throughput();
        if rate <= 0.0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.completed) as f64;
        Some(Duration::from_secs_f64(remaining / rate))
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eta = match self.eta() {
            Some(eta) => format!("{:.0}s", eta.as_secs_f64()),
            None => "--".to_string(),
        };
        write!(
            f,
            "⏳ 进度 {}/{} ({:.1}%) | {:.2} 题/秒 | 预计剩余 {} | 错误 {}",
            self.completed,
            self.total,
            self.percent(),
            self.throughput(),
            eta,
            self.errors
        )
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    started: Instant,
    last_report: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self::starting_at(total, Instant::now())
    }

    fn starting_at(total: usize, now: Instant) -> Self {
        Self {
            total,
            completed: 0,
            started: now,
            last_report: now,
        }
    }

    /// 记录一道题完成；需要输出时返回快照
    pub fn record_completion(&mut self, errors: usize) -> Option<ProgressSnapshot> {
        self.record_completion_at(Instant::now(), errors)
    }

    fn record_completion_at(&mut self, now: Instant, errors: usize) -> Option<ProgressSnapshot> {
        self.completed += 1;

        let since_last = now.saturating_duration_since(self.last_report);
        if !should_report(self.completed, since_last) {
            return None;
        }

        self.last_report = now;
        Some(ProgressSnapshot {
            completed: self.completed,
            total: self.total,
            elapsed: now.saturating_duration_since(self.started),
            errors,
        })
    }
}

pub fn should_report(completed: usize, since_last: Duration) -> bool {
    completed % REPORT_EVERY == 0 || since_last >= REPORT_INTERVAL
}
