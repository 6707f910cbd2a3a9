use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::models::question::{min_chars, ExamQuestion, QuestionType};

/// 单次请求最多生成的题目数
pub const MAX_GENERATE_COUNT: u32 = 10;

pub const DEFAULT_DIFFICULTY: &str = "一般";

/// 出题请求
///
/// 提供了 `description` 时，其余字段只作参考，两者冲突以描述为准；
/// 否则课程、知识点、题型、数量都必须给出。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionGenerateRequest {
    /// 课程名称
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub knowledge_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    /// 题目数量，0 表示未提供
    #[serde(default)]
    pub count: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    /// 自由描述
    #[serde(default)]
    pub description: String,
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

impl Default for QuestionGenerateRequest {
    fn default() -> Self {
        Self {
            topic: String::new(),
            knowledge_points: Vec::new(),
            question_type: None,
            count: 0,
            difficulty: default_difficulty(),
            description: String::new(),
        }
    }
}

impl QuestionGenerateRequest {
    pub fn normalized(mut self) -> Self {
        self.topic = self.topic.trim().to_string();
        self.knowledge_points = self
            .knowledge_points
            .into_iter()
            .map(|point| point.trim().to_string())
            .filter(|point| !point.is_empty())
            .collect();
        self.difficulty = match self.difficulty.trim() {
            "" => default_difficulty(),
            difficulty => difficulty.to_string(),
        };
        self.description = self.description.trim().to_string();
        self
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// 实际生成的题目数：未提供数量时生成 1 道
    pub fn effective_count(&self) -> u32 {
        self.count.max(1)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.count > MAX_GENERATE_COUNT {
            return Err(InputError::OutOfRange {
                field: "count",
                value: self.count as i64,
                min: 0,
                max: MAX_GENERATE_COUNT as i64,
            });
        }
        if self.has_description() {
            return Ok(());
        }

        min_chars("topic", self.topic.trim(), 1)?;
        if self.knowledge_points.iter().all(|point| point.trim().is_empty()) {
            return Err(InputError::Missing {
                field: "knowledge_points",
            });
        }
        if self.question_type.is_none() {
            return Err(InputError::Missing {
                field: "question_type",
            });
        }
        if self.count == 0 {
            return Err(InputError::Missing { field: "count" });
        }
        Ok(())
    }
}

/// 出题结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedQuestions {
    pub questions: Vec<ExamQuestion>,
    /// 请求的题目数
    pub requested: u32,
    /// 解析失败而放弃的题目数
    pub failed: u32,
    /// 所有调用的尝试次数之和
    pub attempts: u32,
}

impl GeneratedQuestions {
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.questions.len() as u32 == self.requested
    }
}
