//! 答案写入服务 - 业务能力层
//!
//! 只负责把批次结果落盘（JSON / CSV）以及格式校验，不关心结果怎么来的

use crate::error::{AppError, AppResult};
use crate::models::AnswerRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// 单个答案允许的最大字符数（不含）
pub const MAX_ANSWER_CHARS: usize = 5000;

#[derive(Debug, Serialize, Deserialize)]
struct OutputEntry {
    output: String,
}

/// 写入 JSON：`[{"output": "..."}, ...]`，顺序与输入一致
pub async fn write_json(path: &Path, records: &[AnswerRecord]) -> AppResult<()> {
    let entries: Vec<OutputEntry> = records
        .iter()
        .map(|r| OutputEntry {
            output: r.output.clone(),
        })
        .collect();
    let content = serde_json::to_string_pretty(&entries)?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    info!("💾 已写入 {} 条答案: {}", records.len(), path.display());
    Ok(())
}

/// 写入 CSV：表头 `id,output`
pub async fn write_csv(path: &Path, records: &[AnswerRecord]) -> AppResult<()> {
    let content = render_csv(records);

    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    info!("💾 已写入 CSV: {}", path.display());
    Ok(())
}

fn render_csv(records: &[AnswerRecord]) -> String {
    let mut out = String::from("id,output\n");
    for record in records {
        out.push_str(&csv_field(&record.id));
        out.push(',');
        out.push_str(&csv_field(&record.output));
        out.push('\n');
    }
    out
}

/// 含逗号、引号或换行的字段用双引号包裹，内部引号加倍
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// 校验答案格式：每个答案都必须短于 `MAX_ANSWER_CHARS`
pub fn validate_answers(records: &[AnswerRecord]) -> AppResult<()> {
    validate_outputs(records.iter().map(|r| r.output.as_str()))
}

/// 重新读取已写入的 JSON 文件并校验
pub async fn validate_answer_file(path: &Path) -> AppResult<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let entries: Vec<OutputEntry> =
        serde_json::from_str(&content).map_err(|source| AppError::JsonParse {
            path: path.display().to_string(),
            source,
        })?;

    validate_outputs(entries.iter().map(|e| e.output.as_str()))?;
    debug!("答案文件校验通过: {} 条", entries.len());
    Ok(entries.len())
}

fn validate_outputs<'a>(outputs: impl Iterator<Item = &'a str>) -> AppResult<()> {
    for (index, output) in outputs.enumerate() {
        let len = output.chars().count();
        if len >= MAX_ANSWER_CHARS {
            return Err(AppError::AnswerTooLong {
                index,
                len,
                limit: MAX_ANSWER_CHARS,
            });
        }
    }
    Ok(())
}
