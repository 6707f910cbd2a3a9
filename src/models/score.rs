use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::models::question::min_chars;

/// 可判分的题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoredQuestionType {
    #[serde(rename = "填空题")]
    FillBlank,
    #[serde(rename = "简答题")]
    BriefAnswer,
    #[serde(rename = "编程题")]
    Programming,
}

impl fmt::Display for ScoredQuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoredQuestionType::FillBlank => "填空题",
            ScoredQuestionType::BriefAnswer => "简答题",
            ScoredQuestionType::Programming => "编程题",
        };
        f.write_str(label)
    }
}

/// 判分输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreJudgmentInput {
    pub question_title: String,
    pub question_type: ScoredQuestionType,
    pub standard_answer: String,
    /// 考生答案
    pub student_answer: String,
    /// 满分，必须大于0
    pub full_score: u32,
    /// 评分细则，缺省时自动生成
    #[serde(default)]
    pub grading_criteria: Option<String>,
}

impl ScoreJudgmentInput {
    pub fn normalized(mut self) -> Self {
        self.question_title = self.question_title.trim().to_string();
        self.standard_answer = self.standard_answer.trim().to_string();
        self.student_answer = self.student_answer.trim().to_string();
        self.grading_criteria = self
            .grading_criteria
            .map(|criteria| criteria.trim().to_string())
            .filter(|criteria| !criteria.is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.full_score == 0 {
            return Err(InputError::OutOfRange {
                field: "full_score",
                value: 0,
                min: 1,
                max: u32::MAX as i64,
            });
        }
        min_chars("question_title", &self.question_title, 1)?;
        min_chars("standard_answer", &self.standard_answer, 1)?;
        Ok(())
    }
}

/// 判分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreJudgmentOutput {
    /// 考生得分
    pub score: i64,
    /// 判分理由
    pub sj_reason: String,
}

/// 评分细则生成结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingCriteriaOutput {
    pub grading_criteria: String,
}
