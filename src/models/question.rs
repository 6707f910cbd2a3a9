use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InputError;

/// 考试题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "单选题")]
    SingleChoice,
    #[serde(rename = "多选题")]
    MultiChoice,
    #[serde(rename = "填空题")]
    FillBlank,
    #[serde(rename = "简答题")]
    BriefAnswer,
    #[serde(rename = "计算题")]
    Calculation,
    #[serde(rename = "编程题")]
    Programming,
}

impl QuestionType {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "单选题",
            QuestionType::MultiChoice => "多选题",
            QuestionType::FillBlank => "填空题",
            QuestionType::BriefAnswer => "简答题",
            QuestionType::Calculation => "计算题",
            QuestionType::Programming => "编程题",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 考试题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// 题干，至少5个字符
    pub question: String,
    pub answer: String,
    pub question_type: QuestionType,
    /// 答案解析
    pub answer_analysis: String,
    /// 所属知识点
    #[serde(default, deserialize_with = "null_as_empty")]
    pub knowledge_point: String,
    /// 知识点的具体描述
    #[serde(default, deserialize_with = "null_as_empty")]
    pub knowledge_point_description: String,
    /// 额外要求
    #[serde(default, deserialize_with = "null_as_empty")]
    pub extra_requirement: String,
}

impl ExamQuestion {
    /// 去除所有字符串首尾空白
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.question,
            &mut self.answer,
            &mut self.answer_analysis,
            &mut self.knowledge_point,
            &mut self.knowledge_point_description,
            &mut self.extra_requirement,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }
        self
    }

    /// 检查题目、答案、解析是否满足最小长度
    pub fn validate(&self) -> Result<(), InputError> {
        min_chars("question", &self.question, 5)?;
        min_chars("answer", &self.answer, 1)?;
        min_chars("answer_analysis", &self.answer_analysis, 1)?;
        Ok(())
    }
}

/// 核查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_compliant: bool,
    /// 修正意见
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl VerificationResult {
    pub fn compliant() -> Self {
        Self {
            is_compliant: true,
            suggestion: None,
        }
    }

    pub fn non_compliant(suggestion: impl Into<String>) -> Self {
        Self {
            is_compliant: false,
            suggestion: Some(suggestion.into()),
        }
    }
}

/// 修正请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixRequest {
    pub exam_question: ExamQuestion,
    pub verification_result: VerificationResult,
}

/// 核查并修正请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyAndFixRequest {
    pub exam_question: ExamQuestion,
    /// 最大核查次数，范围1-5；未指定时使用配置中的默认值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fix_attempts: Option<u32>,
}

pub const MIN_FIX_ATTEMPTS: u32 = 1;
pub const MAX_FIX_ATTEMPTS: u32 = 5;
pub const DEFAULT_FIX_ATTEMPTS: u32 = 3;

impl VerifyAndFixRequest {
    /// 未指定次数时填入默认值
    pub fn with_default_attempts(mut self, default: u32) -> Self {
        self.max_fix_attempts.get_or_insert(default);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.max_fix_attempts.unwrap_or(DEFAULT_FIX_ATTEMPTS)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        let attempts = self.attempts();
        if !(MIN_FIX_ATTEMPTS..=MAX_FIX_ATTEMPTS).contains(&attempts) {
            return Err(InputError::OutOfRange {
                field: "max_fix_attempts",
                value: attempts as i64,
                min: MIN_FIX_ATTEMPTS as i64,
                max: MAX_FIX_ATTEMPTS as i64,
            });
        }
        self.exam_question.validate()
    }
}

pub(crate) fn min_chars(field: &'static str, value: &str, min: usize) -> Result<(), InputError> {
    if value.chars().count() < min {
        return Err(InputError::TooShort { field, min });
    }
    Ok(())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ExamQuestion {
        ExamQuestion {
            question: "  有一个容量为10的背包，最大价值是______。 ".to_string(),
            answer: "90".to_string(),
            question_type: QuestionType::FillBlank,
            answer_analysis: "典型的01背包问题\n".to_string(),
            knowledge_point: "动态规划".to_string(),
            knowledge_point_description: String::new(),
            extra_requirement: String::new(),
        }
    }

    #[test]
    fn test_question_type_uses_chinese_labels() {
        let value = serde_json::to_value(QuestionType::Programming).unwrap();
        assert_eq!(value, json!("编程题"));
        let parsed: QuestionType = serde_json::from_value(json!("填空题")).unwrap();
        assert_eq!(parsed, QuestionType::FillBlank);
        assert!(serde_json::from_value::<QuestionType>(json!("判断题")).is_err());
    }

    #[test]
    fn test_null_optional_fields_become_empty() {
        let question: ExamQuestion = serde_json::from_value(json!({
            "question": "DFS 与 BFS 的区别是什么？",
            "answer": "栈与队列",
            "question_type": "简答题",
            "answer_analysis": "略",
            "knowledge_point": null,
        }))
        .unwrap();

        assert_eq!(question.knowledge_point, "");
        assert_eq!(question.extra_requirement, "");
    }

    #[test]
    fn test_normalized_trims() {
        let question = sample().normalized();
        assert_eq!(question.question, "有一个容量为10的背包，最大价值是______。");
        assert_eq!(question.answer_analysis, "典型的01背包问题");
    }

    #[test]
    fn test_validate_min_lengths() {
        assert!(sample().validate().is_ok());

        let short = ExamQuestion {
            question: "1+1".to_string(),
            ..sample()
        };
        assert!(matches!(
            short.validate(),
            Err(InputError::TooShort { field: "question", min: 5 })
        ));

        let no_answer = ExamQuestion {
            answer: String::new(),
            ..sample()
        };
        assert!(no_answer.validate().is_err());
    }

    #[test]
    fn test_verify_request_attempt_range() {
        let mut request = VerifyAndFixRequest {
            exam_question: sample(),
            max_fix_attempts: Some(3),
        };
        assert!(request.validate().is_ok());

        request.max_fix_attempts = Some(0);
        assert!(request.validate().is_err());
        request.max_fix_attempts = Some(6);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_verify_request_default_attempts() {
        let request: VerifyAndFixRequest = serde_json::from_value(json!({
            "exam_question": serde_json::to_value(sample()).unwrap(),
        }))
        .unwrap();
        assert_eq!(request.max_fix_attempts, None);
        assert_eq!(request.attempts(), DEFAULT_FIX_ATTEMPTS);

        let request = request.with_default_attempts(5);
        assert_eq!(request.attempts(), 5);
        let request = request.with_default_attempts(2);
        assert_eq!(request.attempts(), 5);
    }
}
