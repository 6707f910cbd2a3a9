use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::models::question::min_chars;

/// 考试设置提取输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSettingsInput {
    /// 包含考试设置信息的文本内容
    pub text_content: String,
}

impl ExamSettingsInput {
    pub fn validate(&self) -> Result<(), InputError> {
        min_chars("text_content", self.text_content.trim(), 1)
    }
}

/// 考试设置提取结果，文本中没有的信息为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSettingsOutput {
    /// 考试时间（例如：2024-01-15 14:00-16:00）
    #[serde(default)]
    pub exam_time: Option<String>,
    /// 考试时长（例如：2小时0分钟）
    #[serde(default)]
    pub duration: Option<String>,
    /// 提前入场时间（分钟）
    #[serde(default)]
    pub early_entry_time: Option<String>,
    /// 开考后禁止入场时间（分钟）
    #[serde(default)]
    pub late_entry_deadline: Option<String>,
    /// 剩余多少分钟可交卷
    #[serde(default)]
    pub submission_time_setting: Option<String>,
    /// 及格线（例如：60%）
    #[serde(default)]
    pub passing_score_percentage: Option<String>,
}

impl ExamSettingsOutput {
    pub const FIELDS: [&'static str; 6] = [
        "exam_time",
        "duration",
        "early_entry_time",
        "late_entry_deadline",
        "submission_time_setting",
        "passing_score_percentage",
    ];

    /// 去除首尾空白，空字符串视为未提取到
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            exam_time: clean(self.exam_time),
            duration: clean(self.duration),
            early_entry_time: clean(self.early_entry_time),
            late_entry_deadline: clean(self.late_entry_deadline),
            submission_time_setting: clean(self.submission_time_setting),
            passing_score_percentage: clean(self.passing_score_percentage),
        }
    }

    /// 提取到的字段数量
    pub fn filled_count(&self) -> usize {
        [
            &self.exam_time,
            &self.duration,
            &self.early_entry_time,
            &self.late_entry_deadline,
            &self.submission_time_setting,
            &self.passing_score_percentage,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_blank_values() {
        let output = ExamSettingsOutput {
            exam_time: Some(" 2024-01-15 14:00-16:00 ".to_string()),
            duration: Some("  ".to_string()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(output.exam_time.as_deref(), Some("2024-01-15 14:00-16:00"));
        assert_eq!(output.duration, None);
        assert_eq!(output.filled_count(), 1);
    }

    #[test]
    fn test_blank_text_rejected() {
        let input = ExamSettingsInput {
            text_content: " \n ".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
