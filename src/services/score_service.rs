//! 判分服务 - 业务能力层

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::RawGenerator;
use crate::models::{GradingCriteriaOutput, ScoreJudgmentInput, ScoreJudgmentOutput};
use crate::services::prompts;
use crate::structured::{OutputSchema, Structured, StructuredOutputCaller};

/// 判分结果无法解析时的理由
pub const SCORE_PARSE_FAILURE: &str = "系统无法正确解析AI响应，请人工复核该答案。";

/// 评分细则无法生成时使用的通用细则
pub const DEFAULT_GRADING_CRITERIA: &str =
    "按标准答案的要点给分：完全正确得满分，部分正确按覆盖的要点比例给分，错误或空白不得分。";

/// 判分服务
pub struct ScoreService {
    caller: StructuredOutputCaller,
}

impl ScoreService {
    pub fn new(generator: Arc<dyn RawGenerator>, config: &Config) -> Self {
        Self {
            caller: StructuredOutputCaller::new(generator, config.max_json_retry_attempts),
        }
    }

    /// 生成评分细则
    pub async fn design_grading_criteria(
        &self,
        input: &ScoreJudgmentInput,
    ) -> AppResult<Structured<String>> {
        let schema = OutputSchema::new().string("grading_criteria");
        let prompt = prompts::grading_criteria_prompt(input, &schema);

        let result = self
            .caller
            .call_checked(
                &prompt,
                &schema,
                GradingCriteriaOutput {
                    grading_criteria: DEFAULT_GRADING_CRITERIA.to_string(),
                },
                |output: &GradingCriteriaOutput| {
                    if output.grading_criteria.trim().is_empty() {
                        Err("grading_criteria 不能为空".to_string())
                    } else {
                        Ok(())
                    }
                },
            )
            .await?;

        if result.is_fallback() {
            warn!("评分细则生成失败，使用通用细则");
        }
        Ok(result.map(|output| output.grading_criteria.trim().to_string()))
    }

    /// 判分
    ///
    /// 未提供评分细则时先生成细则。得分必须在 0 到满分之间，否则重试。
    pub async fn judge(&self, input: ScoreJudgmentInput) -> AppResult<Structured<ScoreJudgmentOutput>> {
        let input = input.normalized();
        input.validate()?;

        let criteria = match &input.grading_criteria {
            Some(criteria) => criteria.clone(),
            None => {
                info!("未提供评分细则，正在生成...");
                self.design_grading_criteria(&input).await?.value
            }
        };
        debug!("评分细则: {}", criteria);

        let schema = OutputSchema::new().integer("score").string("sj_reason");
        let prompt = prompts::score_prompt(&input, &criteria, &schema);
        let full_score = input.full_score as i64;

        let result = self
            .caller
            .call_checked(
                &prompt,
                &schema,
                ScoreJudgmentOutput {
                    score: 0,
                    sj_reason: SCORE_PARSE_FAILURE.to_string(),
                },
                move |output: &ScoreJudgmentOutput| {
                    if (0..=full_score).contains(&output.score) {
                        Ok(())
                    } else {
                        Err(format!("score 必须在 0 到 {} 之间", full_score))
                    }
                },
            )
            .await?;

        if result.is_fallback() {
            warn!("判分结果解析失败，得分记为 0，需人工复核");
        } else {
            info!("判分完成: {}/{}", result.value.score, full_score);
        }
        Ok(result)
    }
}
