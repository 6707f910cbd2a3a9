//! # Exam Agent
//!
//! 围绕不可靠的 LLM 文本生成器，可靠地产出结构化结果：题目核查与修正、答案判分、考试设置提取、出题
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 LLM 客户端，只暴露"输入提示词、输出文本"的能力
//! - `RawGenerator` - 生成器接口
//! - `OpenAiGenerator` - OpenAI 兼容接口实现
//! - `ScriptedGenerator` - 按脚本回复的测试替身
//!
//! ### ② 结构化输出层（Structured）
//! - `structured/` - 把自由文本变成经过校验的结构化值
//! - `OutputSchema` - 必填字段及类型声明
//! - `StructuredOutputCaller` - 解析 → 校验 → 有限次重试 → 兜底
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个任务
//! - `VerificationService` - 核查 / 修正题目
//! - `ScoreService` - 评分细则 / 判分
//! - `SettingsService` - 考试设置提取
//! - `GenerationService` - 按知识点或描述出题
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个任务"的完整处理流程
//! - `ConvergenceLoop` - 评估 → 修正 → 再评估，直到通过或次数用尽
//! - `TaskFlow` - 任务分发与标准响应
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量任务处理器，管理资源和并发
//! - `orchestrator/file_processor` - 单个任务文件处理器
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod structured;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, LlmError};
pub use infrastructure::{OpenAiGenerator, RawGenerator, ScriptedGenerator};
pub use models::{ExamQuestion, StandardResponse, Task, TaskFile};
pub use orchestrator::App;
pub use structured::{OutputSchema, Structured, StructuredOutputCaller};
pub use workflow::{ConvergenceLoop, Refiner, TaskFlow, Verdict};
