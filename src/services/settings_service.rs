//! 考试设置提取服务 - 业务能力层

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::RawGenerator;
use crate::models::{ExamSettingsInput, ExamSettingsOutput};
use crate::services::prompts;
use crate::structured::{OutputSchema, Structured, StructuredOutputCaller};

/// 考试设置提取服务
pub struct SettingsService {
    caller: StructuredOutputCaller,
}

impl SettingsService {
    pub fn new(generator: Arc<dyn RawGenerator>, config: &Config) -> Self {
        Self {
            caller: StructuredOutputCaller::new(generator, config.max_json_retry_attempts),
        }
    }

    fn settings_schema() -> OutputSchema {
        ExamSettingsOutput::FIELDS
            .iter()
            .fold(OutputSchema::new(), |schema, field| schema.optional_string(*field))
    }

    /// 提取考试设置，解析失败时所有字段为空
    pub async fn extract(&self, input: &ExamSettingsInput) -> AppResult<Structured<ExamSettingsOutput>> {
        input.validate()?;

        let schema = Self::settings_schema();
        let prompt = prompts::settings_prompt(input.text_content.trim(), &schema);

        let result = self
            .caller
            .call(&prompt, &schema, ExamSettingsOutput::default())
            .await?
            .map(ExamSettingsOutput::normalized);

        if result.is_fallback() {
            warn!("考试设置解析失败，返回空结果");
        } else {
            info!("考试设置提取完成，提取到 {} 项", result.value.filled_count());
        }
        Ok(result)
    }
}
