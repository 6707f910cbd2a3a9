//! 从 LLM 原始文本中解码 JSON
//!
//! 模型经常在 JSON 外面包一层 ```json 代码块，或者在前后加几句说明，
//! 这里按"整段 → 代码块 → 最外层花括号"的顺序依次尝试。

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("代码块正则无效")
});

/// 解码失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// 响应为空
    Empty,
    /// 无法解析为 JSON
    NotJson(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::Empty => write!(f, "响应内容为空"),
            DecodeFailure::NotJson(reason) => write!(f, "无法解析为JSON: {}", reason),
        }
    }
}

/// 把原始文本解码为 JSON 值
pub fn decode_json(raw: &str) -> Result<JsonValue, DecodeFailure> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DecodeFailure::Empty);
    }

    let first_error = match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(body) = caps.get(1) {
            if let Ok(value) = serde_json::from_str::<JsonValue>(body.as_str()) {
                return Ok(value);
            }
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<JsonValue>(&text[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(DecodeFailure::NotJson(first_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = decode_json(r#"  {"is_compliant": true, "suggestion": ""} "#).unwrap();
        assert_eq!(value, json!({"is_compliant": true, "suggestion": ""}));
    }

    #[test]
    fn test_fenced_json() {
        let raw = "以下是核查结果：\n```json\n{\"is_compliant\": false, \"suggestion\": \"答案有误\"}\n```\n请参考。";
        let value = decode_json(raw).unwrap();
        assert_eq!(value["suggestion"], "答案有误");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let value = decode_json("```\n{\"score\": 8}\n```").unwrap();
        assert_eq!(value["score"], 8);
    }

    #[test]
    fn test_braces_inside_prose() {
        let raw = "好的，结果如下 {\"score\": 6, \"sj_reason\": \"缺少边界处理\"} 以上。";
        let value = decode_json(raw).unwrap();
        assert_eq!(value["score"], 6);
    }

    #[test]
    fn test_failures() {
        assert_eq!(decode_json("   \n"), Err(DecodeFailure::Empty));
        assert!(matches!(
            decode_json("这道题目是合规的"),
            Err(DecodeFailure::NotJson(_))
        ));
        assert!(matches!(
            decode_json("{\"score\": 6,"),
            Err(DecodeFailure::NotJson(_))
        ));
    }
}
