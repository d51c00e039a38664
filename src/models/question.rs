use serde::{Deserialize, Serialize};

/// 未标注领域时使用的占位值
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// 一道待解答的题目
///
/// 读入后不再修改；身份由它在输入序列中的位置决定，`id` 只用于输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub input: String,
    #[serde(default = "default_domain", deserialize_with = "deserialize_domain")]
    pub domain: String,
    /// 开发集中的参考答案（对应 JSON 中的 `output` 字段）
    #[serde(default, rename = "output", skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl Question {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            id: None,
            input: input.into(),
            domain: default_domain(),
            expected: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 输出用的 id：显式 id 优先，否则使用下标
    pub fn resolved_id(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| index.to_string())
    }
}

fn default_domain() -> String {
    UNKNOWN_DOMAIN.to_string()
}

// 显式的 null 与缺省相同
fn deserialize_domain<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let domain: Option<String> = Option::deserialize(deserializer)?;
    Ok(domain.unwrap_or_else(default_domain))
}

// id 既可能是字符串也可能是整数
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// 单个策略在单道题上的运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    pub answer: String,
    pub error_message: Option<String>,
}

impl SolveOutcome {
    pub fn success(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            error_message: None,
        }
    }

    /// 失败时答案固定为空字符串
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            answer: String::new(),
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }
}

/// 批次结果中的一条记录，顺序与输入一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub id: String,
    pub output: String,
}

/// 单道题失败时记录的 (下标, 错误信息)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 {}] {}", self.index, self.message)
    }
}
