use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::generation::QuestionGenerateRequest;
use crate::models::question::{FixRequest, VerifyAndFixRequest};
use crate::models::score::ScoreJudgmentInput;
use crate::models::settings::ExamSettingsInput;

/// 一个任务文件
///
/// ```toml
/// [[verify]]
/// max_fix_attempts = 3
/// [verify.exam_question]
/// question = "..."
///
/// [[settings]]
/// text_content = "..."
///
/// [[generate]]
/// description = "..."
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFile {
    /// 核查并修正
    #[serde(default)]
    pub verify: Vec<VerifyAndFixRequest>,
    /// 按给定核查结果修正
    #[serde(default)]
    pub fix: Vec<FixRequest>,
    /// 判分
    #[serde(default)]
    pub score: Vec<ScoreJudgmentInput>,
    /// 考试设置提取
    #[serde(default)]
    pub settings: Vec<ExamSettingsInput>,
    /// 出题
    #[serde(default)]
    pub generate: Vec<QuestionGenerateRequest>,
    /// 文件路径（加载时填充）
    #[serde(skip)]
    pub file_path: Option<String>,
}

/// 单个任务
#[derive(Debug, Clone)]
pub enum Task {
    VerifyAndFix(VerifyAndFixRequest),
    Fix(FixRequest),
    Score(ScoreJudgmentInput),
    Settings(ExamSettingsInput),
    Generate(QuestionGenerateRequest),
}

impl Task {
    /// 任务类型（用于日志和结果文件）
    pub fn kind(&self) -> &'static str {
        match self {
            Task::VerifyAndFix(_) => "verify",
            Task::Fix(_) => "fix",
            Task::Score(_) => "score",
            Task::Settings(_) => "settings",
            Task::Generate(_) => "generate",
        }
    }
}

impl TaskFile {
    pub fn task_count(&self) -> usize {
        self.verify.len()
            + self.fix.len()
            + self.score.len()
            + self.settings.len()
            + self.generate.len()
    }

    /// 按 verify → fix → score → settings → generate 的顺序展开为任务列表
    pub fn into_tasks(self) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(self.task_count());
        tasks.extend(self.verify.into_iter().map(Task::VerifyAndFix));
        tasks.extend(self.fix.into_iter().map(Task::Fix));
        tasks.extend(self.score.into_iter().map(Task::Score));
        tasks.extend(self.settings.into_iter().map(Task::Settings));
        tasks.extend(self.generate.into_iter().map(Task::Generate));
        tasks
    }

    /// 文件名（不含扩展名），用于命名结果文件
    pub fn name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(|p| Path::new(p).file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "tasks".to_string())
    }
}
