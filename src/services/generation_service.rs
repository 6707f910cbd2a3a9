//! 出题服务 - 业务能力层
//!
//! 按请求逐题生成，每道题单独走一次结构化调用；解析失败的题目直接丢弃。

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::RawGenerator;
use crate::models::{ExamQuestion, GeneratedQuestions, QuestionGenerateRequest, QuestionType};
use crate::services::prompts;
use crate::services::VerificationService;
use crate::structured::StructuredOutputCaller;

/// 出题服务
pub struct GenerationService {
    caller: StructuredOutputCaller,
}

impl GenerationService {
    pub fn new(generator: Arc<dyn RawGenerator>, config: &Config) -> Self {
        Self {
            caller: StructuredOutputCaller::new(generator, config.max_json_retry_attempts),
        }
    }

    /// 解析失败时的占位题目，不会出现在结果里
    fn placeholder(question_type: QuestionType) -> ExamQuestion {
        ExamQuestion {
            question: String::new(),
            answer: String::new(),
            question_type,
            answer_analysis: String::new(),
            knowledge_point: String::new(),
            knowledge_point_description: String::new(),
            extra_requirement: String::new(),
        }
    }

    /// 生成题目
    ///
    /// 未提供描述时，生成的题型必须与请求一致，否则重试。
    pub async fn generate(&self, request: QuestionGenerateRequest) -> AppResult<GeneratedQuestions> {
        let request = request.normalized();
        request.validate()?;

        let total = request.effective_count();
        let schema = VerificationService::question_schema();
        let required_type = request
            .question_type
            .filter(|_| !request.has_description());
        let placeholder_type = request.question_type.unwrap_or(QuestionType::BriefAnswer);

        let mut result = GeneratedQuestions {
            requested: total,
            ..Default::default()
        };
        let mut previous: Vec<String> = Vec::new();

        for index in 1..=total {
            let prompt = prompts::generation_prompt(&request, index, total, &previous, &schema);

            let generated = self
                .caller
                .call_checked(
                    &prompt,
                    &schema,
                    Self::placeholder(placeholder_type),
                    move |question: &ExamQuestion| {
                        let question = question.clone().normalized();
                        question.validate().map_err(|e| e.to_string())?;
                        match required_type {
                            Some(expected) if question.question_type != expected => {
                                Err(format!("question_type 必须为{}", expected))
                            }
                            _ => Ok(()),
                        }
                    },
                )
                .await?;

            result.attempts += generated.attempts;
            if generated.is_fallback() {
                warn!("第{}/{}道题解析失败，已放弃", index, total);
                result.failed += 1;
                continue;
            }

            let question = generated.value.normalized();
            previous.push(question.question.clone());
            result.questions.push(question);
        }

        info!(
            "出题完成: 成功 {}/{} 道，共调用 {} 次",
            result.questions.len(),
            total,
            result.attempts
        );
        Ok(result)
    }
}
