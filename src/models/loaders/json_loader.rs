use crate::models::question::Question;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载题目列表
///
/// 文件内容必须是对象数组，每个对象至少包含 `input` 字段。
/// `limit` 为 Some(n) 时只保留前 n 道题。
pub async fn load_questions(json_file_path: &Path, limit: Option<usize>) -> Result<Vec<Question>> {
    let content = fs::read_to_string(json_file_path)
        .await
        .with_context(|| format!("无法读取JSON文件: {}", json_file_path.display()))?;

    let mut questions: Vec<Question> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析JSON文件: {}", json_file_path.display()))?;

    if let Some(limit) = limit {
        questions.truncate(limit);
    }

    tracing::info!(
        "成功加载 {} 道题目: {}",
        questions.len(),
        json_file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
    );

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_with_limit() {
        let file = write_temp(
            r#"[
                {"input": "q0"},
                {"input": "q1", "domain": "math"},
                {"input": "q2"}
            ]"#,
        );

        let questions = load_questions(file.path(), Some(2)).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].domain, "math");
        assert_eq!(questions[0].resolved_id(0), "0");
    }

    #[tokio::test]
    async fn test_limit_larger_than_file() {
        let file = write_temp(r#"[{"input": "only"}]"#);
        let questions = load_questions(file.path(), Some(50)).await.unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[tokio::test]
    async fn test_not_an_array_fails_with_path() {
        let file = write_temp(r#"{"input": "q"}"#);
        let err = load_questions(file.path(), None).await.unwrap_err();
        assert!(err.to_string().contains("无法解析JSON文件"));
    }
}
