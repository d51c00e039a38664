//! 答案提取 - 业务能力层
//!
//! 把模型返回的自由文本压缩成简短的最终答案。所有函数都是纯函数。

use regex::Regex;
use std::sync::LazyLock;

/// 显式答案标记，按顺序尝试，第一个命中的生效
static ANSWER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)final\s+answer\s*[:：]\s*(.+?)\s*(?:\n|$)",
        r"(?i)\b(?:answer|result)\s*[:：]\s*(.+?)\s*(?:\n|$)",
        r"####\s*(.+?)\s*(?:\n|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("answer pattern must compile"))
    .collect()
});

/// 推理结论标记（思维链专用），取文本中最后一次出现
static CONCLUSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bthe\s+answer\s+is\s*[:：]?\s*(.+?)\s*(?:\n|$)",
        r"(?i)\btherefore\b[,:]?\s*(.+?)\s*(?:\n|$)",
        r"(?i)\bthus\b[,:]?\s*(.+?)\s*(?:\n|$)",
        r"(?i)\bso\b[,:]?\s+(.+?)\s*(?:\n|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("conclusion pattern must compile"))
    .collect()
});

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-']").expect("normalize pattern must compile"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("number pattern must compile"));

/// 提取最终答案
///
/// 1. 依次匹配 `final answer:`、`answer:`/`result:`、`####`
/// 2. 否则取最后一个非空行
/// 3. 单行文本直接返回去掉首尾空白的原文
pub fn extract(raw: &str) -> String {
    match_answer_marker(raw).unwrap_or_else(|| last_line(raw))
}

/// 思维链输出的答案提取
///
/// 先尝试显式答案标记，再尝试 "the answer is / therefore / thus / so" 等结论句，
/// 最后退回到最后一个非空行
pub fn extract_reasoning(raw: &str) -> String {
    if let Some(answer) = match_answer_marker(raw) {
        return answer;
    }

    for pattern in CONCLUSION_PATTERNS.iter() {
        if let Some(caps) = pattern.captures_iter(raw).last() {
            let answer = caps[1].trim().trim_end_matches('.').trim();
            if !answer.is_empty() {
                return answer.to_string();
            }
        }
    }

    last_line(raw)
}

fn match_answer_marker(raw: &str) -> Option<String> {
    ANSWER_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(raw)
            .map(|caps| caps[1].trim().to_string())
            .filter(|answer| !answer.is_empty())
    })
}

fn last_line(raw: &str) -> String {
    raw.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// 文本归一化（用于宽松比较）
///
/// 小写、去除标点、合并空白，再做少量同义词替换
pub fn normalize_text(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ").trim().to_string();

    let synonym = match collapsed.as_str() {
        "unchanged" | "no change" | "same" => Some("stay the same"),
        "second place" | "2nd" => Some("second"),
        "first place" => Some("first"),
        "third place" => Some("third"),
        _ => None,
    };
    synonym.map(str::to_string).unwrap_or(collapsed)
}

/// 提取文本中的第一个数字
pub fn extract_number(s: &str) -> Option<String> {
    NUMBER.find(s).map(|m| m.as_str().to_string())
}
