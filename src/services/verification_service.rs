//! 题目核查与修正服务 - 业务能力层
//!
//! 只负责单道题目的"核查"和"修正"两种能力，循环交给 `ConvergenceLoop`

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::RawGenerator;
use crate::models::{ExamQuestion, VerificationResult};
use crate::services::prompts;
use crate::structured::{OutputSchema, Structured, StructuredOutputCaller};
use crate::workflow::{Converged, ConvergenceLoop, Refiner, Verdict};

/// 核查结果无法解析时的修正意见
pub const VERIFY_PARSE_FAILURE: &str = "系统无法正确解析AI响应，请手动检查题目合规性。";

/// 判定不合规但没有给出意见时使用
const MISSING_SUGGESTION: &str = "题目不合规，请对照题型规范全面检查题干、答案与解析并修正。";

/// 题目核查与修正服务
pub struct VerificationService {
    caller: StructuredOutputCaller,
}

impl VerificationService {
    pub fn new(generator: Arc<dyn RawGenerator>, config: &Config) -> Self {
        Self {
            caller: StructuredOutputCaller::new(generator, config.max_json_retry_attempts),
        }
    }

    fn verification_schema() -> OutputSchema {
        OutputSchema::new()
            .boolean("is_compliant")
            .optional_string("suggestion")
    }

    pub(crate) fn question_schema() -> OutputSchema {
        OutputSchema::new()
            .string("question")
            .string("answer")
            .string("answer_analysis")
            .string("question_type")
            .optional_string("knowledge_point")
            .optional_string("knowledge_point_description")
            .optional_string("extra_requirement")
    }

    /// 核查题目是否合规
    ///
    /// 解析失败时返回"不合规"的兜底结果，绝不默认合规。
    pub async fn verify(&self, question: &ExamQuestion) -> AppResult<Structured<VerificationResult>> {
        let schema = Self::verification_schema();
        let prompt = prompts::verification_prompt(question, &schema);

        let result = self
            .caller
            .call(
                &prompt,
                &schema,
                VerificationResult::non_compliant(VERIFY_PARSE_FAILURE),
            )
            .await?;

        if result.is_fallback() {
            warn!("核查结果解析失败，按不合规处理");
        }
        Ok(result)
    }

    /// 根据核查结果修正题目
    ///
    /// 核查结果为合规时不调用 LLM，原样返回（来源为 `Skipped`）；
    /// 解析失败时返回原题。
    pub async fn fix(
        &self,
        question: &ExamQuestion,
        verification: &VerificationResult,
    ) -> AppResult<Structured<ExamQuestion>> {
        if verification.is_compliant {
            return Ok(Structured::skipped(question.clone()));
        }

        let suggestion = verification
            .suggestion
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(MISSING_SUGGESTION);

        let schema = Self::question_schema();
        let prompt = prompts::fix_prompt(question, suggestion, &schema);

        let result = self
            .caller
            .call_checked(&prompt, &schema, question.clone(), |fixed: &ExamQuestion| {
                fixed
                    .clone()
                    .normalized()
                    .validate()
                    .map_err(|e| e.to_string())
            })
            .await?;

        if result.is_fallback() {
            warn!("修正结果解析失败，保留原题");
        }
        Ok(result.map(ExamQuestion::normalized))
    }

    /// 核查并修正，直到合规或达到最大核查次数
    pub async fn verify_and_fix(
        &self,
        question: ExamQuestion,
        max_attempts: u32,
    ) -> AppResult<Converged<ExamQuestion>> {
        let question = question.normalized();
        question.validate()?;

        let converged = ConvergenceLoop::new(max_attempts).run(question, self).await?;

        info!(
            "核查完成: {}，共核查 {} 次，修正 {} 次",
            if converged.is_accepted() { "合规" } else { "未收敛" },
            converged.attempts,
            converged.revisions
        );
        Ok(converged)
    }
}

#[async_trait]
impl Refiner for VerificationService {
    type Item = ExamQuestion;

    async fn evaluate(&self, item: &ExamQuestion) -> AppResult<Verdict> {
        let result = self.verify(item).await?.value;
        if result.is_compliant {
            return Ok(Verdict::Accept);
        }
        let reason = result
            .suggestion
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| MISSING_SUGGESTION.to_string());
        Ok(Verdict::Reject(reason))
    }

    async fn revise(&self, item: &ExamQuestion, reason: &str) -> AppResult<ExamQuestion> {
        let verification = VerificationResult::non_compliant(reason);
        Ok(self.fix(item, &verification).await?.value)
    }
}
