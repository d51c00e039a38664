use std::fmt;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 配置值不合法
    #[error("配置错误: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },
    /// 答案超过长度上限
    #[error("第 {index} 个答案过长: {len} 字符 (上限 {limit})")]
    AnswerTooLong {
        index: usize,
        len: usize,
        limit: usize,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse {
            path: String::new(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::TomlParse {
            path: String::new(), // TOML错误通常不包含路径信息
            source: err,
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// 模型调用失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// 请求超时（无状态码）
    Timeout,
    /// 连接失败 / DNS 失败等传输层错误（无状态码）
    Connection,
    /// 服务端返回非 200 状态码
    Http,
    /// 200 响应但响应体无法解析
    Decode,
    /// 请求体构建失败
    Request,
}

impl ModelErrorKind {
    /// 是否属于传输层错误
    pub fn is_transport(self) -> bool {
        matches!(self, ModelErrorKind::Timeout | ModelErrorKind::Connection)
    }
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelErrorKind::Timeout => "timeout",
            ModelErrorKind::Connection => "connection",
            ModelErrorKind::Http => "http",
            ModelErrorKind::Decode => "decode",
            ModelErrorKind::Request => "request",
        };
        f.write_str(name)
    }
}

/// 批次在启动工作池之前被放弃，没有任何结果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchAborted {
    /// 预检（smoke test）失败
    #[error("预检失败，批次已中止 (题目 {question_id}): {reason}")]
    SmokeTestFailed { question_id: String, reason: String },
    /// 预检期间收到取消
    #[error("批次在预检阶段被取消")]
    Cancelled,
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
