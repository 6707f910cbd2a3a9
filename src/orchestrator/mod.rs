//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量任务处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载任务文件（Vec<TaskFile>）
//! - 控制并发数量（Semaphore）
//! - 持有 LLM 生成器
//! - 输出全局统计信息
//!
//! ### `file_processor` - 单个任务文件处理器
//! - 展开文件中的所有任务（Vec<Task>）
//! - 为每个任务加超时
//! - 写出结果文件
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<TaskFile>)
//!     ↓
//! file_processor (处理 Vec<Task>)
//!     ↓
//! workflow::TaskFlow (处理单个 Task)
//!     ↓
//! services (能力层：verification / score / settings)
//!     ↓
//! structured::StructuredOutputCaller (JSON 解析 + 校验 + 重试)
//!     ↓
//! infrastructure (基础设施：RawGenerator)
//! ```

pub mod batch_processor;
pub mod file_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use file_processor::{process_file, result_path, TaskResultEntry};
