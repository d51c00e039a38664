//! 题目处理上下文
//!
//! 封装"我正在处理第几道题"这一信息

use crate::models::Question;
use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 题目在输入中的下标（从0开始）
    pub index: usize,

    /// 输出用的题目 ID
    pub id: String,

    /// 题目领域
    pub domain: String,
}

impl QuestionCtx {
    pub fn new(index: usize, question: &Question) -> Self {
        Self {
            index,
            id: question.resolved_id(index),
            domain: question.domain.clone(),
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 #{} ID#{} 领域#{}]", self.index, self.id, self.domain)
    }
}
