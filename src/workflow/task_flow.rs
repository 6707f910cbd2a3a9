//! 任务处理流程 - 流程层
//!
//! 核心职责：把"一个任务"交给对应的服务，并把结果装进标准响应
//!
//! - verify：核查 → 修正 → 再核查，直到合规或次数用尽
//! - fix：按给定核查结果修正一次
//! - score：（生成评分细则）→ 判分
//! - settings：提取考试设置
//! - generate：按知识点或描述出题

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::RawGenerator;
use crate::models::{
    ExamSettingsInput, FixRequest, QuestionGenerateRequest, ScoreJudgmentInput, StandardResponse,
    Task, VerifyAndFixRequest,
};
use crate::services::{GenerationService, ScoreService, SettingsService, VerificationService};
use crate::utils::logging::truncate_text;
use crate::workflow::task_ctx::TaskCtx;

/// 任务处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 正常完成（核查通过 / 解析成功）
    Completed,
    /// 有结果但不可靠（次数用尽或使用了兜底结果）
    BestEffort,
    /// 失败（输入错误、LLM 不可用、超时）
    Failed,
}

/// 单个任务的输出
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub status: TaskStatus,
    pub response: StandardResponse,
}

impl TaskReport {
    fn new(best_effort: bool, response: StandardResponse) -> Self {
        let status = if best_effort {
            TaskStatus::BestEffort
        } else {
            TaskStatus::Completed
        };
        Self { status, response }
    }

    pub fn failed(response: StandardResponse) -> Self {
        Self {
            status: TaskStatus::Failed,
            response,
        }
    }
}

/// 任务处理流程
///
/// - 不持有跨任务的可变状态，可在并发任务间共享
/// - 任何错误都转换为失败响应，不向上抛出
pub struct TaskFlow {
    verification: VerificationService,
    score: ScoreService,
    settings: SettingsService,
    generation: GenerationService,
    default_fix_attempts: u32,
    verbose_logging: bool,
}

impl TaskFlow {
    pub fn new(generator: Arc<dyn RawGenerator>, config: &Config) -> Self {
        Self {
            verification: VerificationService::new(generator.clone(), config),
            score: ScoreService::new(generator.clone(), config),
            settings: SettingsService::new(generator.clone(), config),
            generation: GenerationService::new(generator, config),
            default_fix_attempts: config.max_fix_attempts,
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, task: Task, ctx: &TaskCtx) -> TaskReport {
        info!("{} 开始处理", ctx);

        let result = match task {
            Task::VerifyAndFix(request) => self.verify_and_fix(request, ctx).await,
            Task::Fix(request) => self.fix(request, ctx).await,
            Task::Score(input) => self.score(input, ctx).await,
            Task::Settings(input) => self.extract_settings(input, ctx).await,
            Task::Generate(request) => self.generate(request, ctx).await,
        };

        match result {
            Ok(report) => report,
            Err(e) => {
                error!("{} ❌ 处理失败: {}", ctx, e);
                TaskReport::failed(StandardResponse::from(&e))
            }
        }
    }

    async fn verify_and_fix(
        &self,
        request: VerifyAndFixRequest,
        ctx: &TaskCtx,
    ) -> AppResult<TaskReport> {
        let request = request.with_default_attempts(self.default_fix_attempts);
        request.validate()?;
        let attempts = request.attempts();
        if self.verbose_logging {
            info!("{} 题干: {}", ctx, truncate_text(&request.exam_question.question, 80));
        }

        let converged = self
            .verification
            .verify_and_fix(request.exam_question, attempts)
            .await?;

        let message = if converged.is_accepted() {
            info!("{} ✓ 核查通过 (第 {} 次)", ctx, converged.attempts);
            "核查通过".to_string()
        } else {
            warn!(
                "{} ⚠️ {} 次核查后仍不合规，返回最后一次修正结果",
                ctx, converged.attempts
            );
            format!("{}次核查后仍不合规，返回最后一次修正结果", converged.attempts)
        };

        let data = json!({
            "exam_question": serde_json::to_value(&converged.item)?,
            "converged": converged.is_accepted(),
            "attempts": converged.attempts,
            "revisions": converged.revisions,
            "last_suggestion": converged.last_reason,
        });
        Ok(TaskReport::new(
            !converged.is_accepted(),
            StandardResponse::success(message, data),
        ))
    }

    async fn fix(&self, request: FixRequest, ctx: &TaskCtx) -> AppResult<TaskReport> {
        let question = request.exam_question.normalized();
        question.validate()?;

        let fixed = self
            .verification
            .fix(&question, &request.verification_result)
            .await?;

        let unparsed = fixed.is_fallback();
        let message = if unparsed {
            warn!("{} ⚠️ 修正结果无法解析，返回原题", ctx);
            "修正结果无法解析，返回原题"
        } else if fixed.is_skipped() {
            "题目已合规，无需修正"
        } else {
            info!("{} ✓ 修正完成", ctx);
            "修正完成"
        };

        let data = json!({
            "exam_question": serde_json::to_value(&fixed.value)?,
            "fallback": unparsed,
            "skipped": fixed.is_skipped(),
        });
        Ok(TaskReport::new(unparsed, StandardResponse::success(message, data)))
    }

    async fn score(&self, input: ScoreJudgmentInput, ctx: &TaskCtx) -> AppResult<TaskReport> {
        let judged = self.score.judge(input).await?;

        let message = if judged.is_fallback() {
            warn!("{} ⚠️ 判分结果无法解析，需人工复核", ctx);
            "判分结果无法解析，需人工复核"
        } else {
            info!("{} ✓ 判分完成: {} 分", ctx, judged.value.score);
            "判分完成"
        };

        let data = json!({
            "score": judged.value.score,
            "sj_reason": judged.value.sj_reason,
            "fallback": judged.is_fallback(),
        });
        Ok(TaskReport::new(
            judged.is_fallback(),
            StandardResponse::success(message, data),
        ))
    }

    async fn extract_settings(
        &self,
        input: ExamSettingsInput,
        ctx: &TaskCtx,
    ) -> AppResult<TaskReport> {
        let extracted = self.settings.extract(&input).await?;

        let message = if extracted.is_fallback() {
            warn!("{} ⚠️ 考试设置无法解析", ctx);
            "考试设置无法解析"
        } else {
            info!("{} ✓ 提取完成", ctx);
            "提取完成"
        };

        let data = json!({
            "settings": serde_json::to_value(&extracted.value)?,
            "fallback": extracted.is_fallback(),
        });
        Ok(TaskReport::new(
            extracted.is_fallback(),
            StandardResponse::success(message, data),
        ))
    }

    async fn generate(&self, request: QuestionGenerateRequest, ctx: &TaskCtx) -> AppResult<TaskReport> {
        let generated = self.generation.generate(request).await?;

        let incomplete = !generated.is_complete();
        let message = if generated.questions.is_empty() {
            warn!("{} ⚠️ 所有题目均无法解析", ctx);
            "所有题目均无法解析".to_string()
        } else if incomplete {
            warn!(
                "{} ⚠️ 仅生成 {}/{} 道题",
                ctx,
                generated.questions.len(),
                generated.requested
            );
            format!("仅生成{}/{}道题", generated.questions.len(), generated.requested)
        } else {
            info!("{} ✓ 生成 {} 道题", ctx, generated.requested);
            "出题完成".to_string()
        };

        let data = serde_json::to_value(&generated)?;
        Ok(TaskReport::new(incomplete, StandardResponse::success(message, data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ScriptedGenerator;
    use crate::models::response::{CODE_GENERATOR_UNAVAILABLE, CODE_INVALID_INPUT};
    use crate::models::{ExamQuestion, QuestionType, VerificationResult};

    fn question() -> ExamQuestion {
        ExamQuestion {
            question: "DFS 和 BFS 分别用什么数据结构实现？".to_string(),
            answer: "栈和队列".to_string(),
            question_type: QuestionType::BriefAnswer,
            answer_analysis: "DFS 纵深，BFS 横扩".to_string(),
            knowledge_point: String::new(),
            knowledge_point_description: String::new(),
            extra_requirement: String::new(),
        }
    }

    fn flow(generator: &Arc<ScriptedGenerator>) -> TaskFlow {
        TaskFlow::new(generator.clone(), &Config::default())
    }

    fn ctx(kind: &'static str) -> TaskCtx {
        TaskCtx::new("test", 1, kind)
    }

    #[tokio::test]
    async fn test_verify_accepted_response() {
        let generator = Arc::new(ScriptedGenerator::with_texts([
            r#"{"is_compliant": true, "suggestion": null}"#,
        ]));
        let task = Task::VerifyAndFix(VerifyAndFixRequest {
            exam_question: question(),
            max_fix_attempts: Some(3),
        });

        let report = flow(&generator).run(task, &ctx("verify")).await;

        assert_eq!(report.status, TaskStatus::Completed);
        let data = report.response.data.unwrap();
        assert_eq!(data["converged"], true);
        assert_eq!(data["attempts"], 1);
        assert_eq!(data["exam_question"]["question_type"], "简答题");
    }

    #[tokio::test]
    async fn test_verify_out_of_range_attempts_is_input_error() {
        let generator = Arc::new(ScriptedGenerator::new());
        let task = Task::VerifyAndFix(VerifyAndFixRequest {
            exam_question: question(),
            max_fix_attempts: Some(9),
        });

        let report = flow(&generator).run(task, &ctx("verify")).await;

        assert_eq!(report.status, TaskStatus::Failed);
        assert_eq!(report.response.code, CODE_INVALID_INPUT);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generator_unavailable_maps_to_failure() {
        let generator = Arc::new(ScriptedGenerator::new());
        let task = Task::Settings(ExamSettingsInput {
            text_content: "考试时长120分钟".to_string(),
        });

        let report = flow(&generator).run(task, &ctx("settings")).await;

        assert_eq!(report.status, TaskStatus::Failed);
        assert_eq!(report.response.code, CODE_GENERATOR_UNAVAILABLE);
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fix_on_compliant_result() {
        let generator = Arc::new(ScriptedGenerator::new());
        let task = Task::Fix(FixRequest {
            exam_question: question(),
            verification_result: VerificationResult::compliant(),
        });

        let report = flow(&generator).run(task, &ctx("fix")).await;

        assert_eq!(report.status, TaskStatus::Completed);
        assert_eq!(report.response.message, "题目已合规，无需修正");
        let data = report.response.data.unwrap();
        assert_eq!(data["fallback"], false);
        assert_eq!(data["skipped"], true);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_response() {
        let generator = Arc::new(ScriptedGenerator::with_texts([
            r#"{"question": "栈的存取规则是______。", "answer": "后进先出", "question_type": "填空题", "answer_analysis": "栈只在栈顶操作"}"#,
            "无",
            "无",
            "无",
        ]));
        let task = Task::Generate(QuestionGenerateRequest {
            topic: "数据结构".to_string(),
            knowledge_points: vec!["栈".to_string()],
            question_type: Some(QuestionType::FillBlank),
            count: 2,
            ..Default::default()
        });

        let report = flow(&generator).run(task, &ctx("generate")).await;

        assert_eq!(report.status, TaskStatus::BestEffort);
        assert_eq!(report.response.message, "仅生成1/2道题");
        let data = report.response.data.unwrap();
        assert_eq!(data["questions"][0]["answer"], "后进先出");
        assert_eq!(data["requested"], 2);
        assert_eq!(data["failed"], 1);
    }

    #[tokio::test]
    async fn test_score_fallback_is_best_effort() {
        let generator = Arc::new(ScriptedGenerator::with_texts(["?", "?", "?"]));
        let task = Task::Score(ScoreJudgmentInput {
            question_title: "1+1=?".to_string(),
            question_type: crate::models::ScoredQuestionType::FillBlank,
            standard_answer: "2".to_string(),
            student_answer: "3".to_string(),
            full_score: 2,
            grading_criteria: Some("答对得 2 分".to_string()),
        });

        let report = flow(&generator).run(task, &ctx("score")).await;

        assert_eq!(report.status, TaskStatus::BestEffort);
        assert!(report.response.is_success());
        assert_eq!(report.response.data.unwrap()["fallback"], true);
    }
}
