//! 开发集评估 - 业务能力层
//!
//! 把生成的答案和题目自带的参考答案（`output` 字段）逐条比对

use crate::models::{AnswerRecord, Question};
use crate::services::answer_extractor::{extract_number, normalize_text};
use crate::utils::logging::truncate_text;
use tracing::info;

/// 一条不匹配的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub input: String,
    pub expected: String,
    pub generated: String,
}

/// 评估结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    /// 去首尾空白后完全一致
    pub correct: usize,
    /// 归一化文本或首个数字一致（包含 `correct`）
    pub lenient_correct: usize,
    /// 带参考答案的题目数
    pub total: usize,
    pub mismatches: Vec<Mismatch>,
}

impl EvaluationReport {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn lenient_accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.lenient_correct as f64 / self.total as f64
        }
    }
}

/// 按下标比对答案；没有参考答案的题目不计入
pub fn evaluate(questions: &[Question], records: &[AnswerRecord]) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    for (index, (question, record)) in questions.iter().zip(records).enumerate() {
        let Some(expected) = question.expected.as_deref() else {
            continue;
        };
        report.total += 1;

        let expected = expected.trim();
        let generated = record.output.trim();

        if generated == expected {
            report.correct += 1;
            report.lenient_correct += 1;
            continue;
        }

        if is_lenient_match(expected, generated) {
            report.lenient_correct += 1;
        }

        report.mismatches.push(Mismatch {
            index,
            input: question.input.clone(),
            expected: expected.to_string(),
            generated: generated.to_string(),
        });
    }

    report
}

fn is_lenient_match(expected: &str, generated: &str) -> bool {
    if generated.is_empty() {
        return false;
    }
    if normalize_text(expected) == normalize_text(generated) {
        return true;
    }
    match (extract_number(expected), extract_number(generated)) {
        (Some(a), Some(b)) => a.parse::<f64>().ok() == b.parse::<f64>().ok(),
        _ => false,
    }
}

/// 输出评估结果（最多展示 `max_samples` 条不匹配）
pub fn log_report(report: &EvaluationReport, max_samples: usize) {
    for mismatch in report.mismatches.iter().take(max_samples) {
        info!("\n❌ 题目 {}:", mismatch.index + 1);
        info!("   输入: {}", truncate_text(&mismatch.input, 100));
        info!("   期望: {}", truncate_text(&mismatch.expected, 200));
        info!("   生成: {}", truncate_text(&mismatch.generated, 200));
    }

    info!("\n{}", "=".repeat(60));
    info!(
        "🎯 准确率: {}/{} ({:.1}%)",
        report.correct,
        report.total,
        report.accuracy() * 100.0
    );
    info!(
        "🎯 宽松准确率: {}/{} ({:.1}%)",
        report.lenient_correct,
        report.total,
        report.lenient_accuracy() * 100.0
    );
    info!("{}", "=".repeat(60));
}
