//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量任务的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、创建 LLM 生成器和任务流程
//! 2. **批量加载**：扫描并加载所有任务文件（`Vec<TaskFile>`）
//! 3. **并发控制**：所有文件共享一个 Semaphore，限制同时进行的任务数
//! 4. **全局统计**：汇总所有文件的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个任务的细节
//! - **资源所有者**：唯一持有生成器的模块
//! - **向下委托**：委托 file_processor 处理单个文件

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{OpenAiGenerator, RawGenerator};
use crate::models::TaskFile;
use crate::orchestrator::file_processor;
use crate::services::prompts;
use crate::utils::logging::{
    append_log_line, init_log_file, log_file_complete, log_file_start, log_files_loaded,
    log_startup, print_final_stats, RunStats,
};
use crate::workflow::TaskFlow;

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<TaskFlow>,
}

impl App {
    /// 初始化应用（使用 OpenAI 兼容接口）
    pub async fn initialize(config: Config) -> Result<Self> {
        let generator =
            Arc::new(OpenAiGenerator::new(&config).with_system_message(prompts::SYSTEM_MESSAGE));
        Self::with_generator(config, generator)
    }

    /// 使用指定生成器初始化应用
    pub fn with_generator(config: Config, generator: Arc<dyn RawGenerator>) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let flow = Arc::new(TaskFlow::new(generator, &config));
        Ok(Self { config, flow })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        // 加载所有任务文件
        let task_files = self.load_task_files().await?;

        if task_files.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(RunStats::default());
        }

        let task_count = task_files.iter().map(TaskFile::task_count).sum();
        log_files_loaded(task_files.len(), task_count);

        // 处理所有文件
        let stats = self.process_all_files(task_files).await;

        // 输出最终统计
        print_final_stats(&stats, &self.config.output_log_file);

        Ok(stats)
    }

    /// 加载任务文件
    async fn load_task_files(&self) -> Result<Vec<TaskFile>> {
        info!("\n📁 正在扫描待处理的任务文件...");
        crate::models::load_all_task_files(&self.config.task_folder).await
    }

    /// 处理所有文件
    ///
    /// 单个文件失败只记录日志，不影响其他文件
    async fn process_all_files(&self, task_files: Vec<TaskFile>) -> RunStats {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_tasks));
        let total_files = task_files.len();
        let mut stats = RunStats::default();

        for (idx, task_file) in task_files.into_iter().enumerate() {
            let name = task_file.name();
            log_file_start(idx + 1, total_files, &name, task_file.task_count());

            let result = file_processor::process_file(
                self.flow.clone(),
                task_file,
                semaphore.clone(),
                self.config.task_timeout(),
                &self.config.output_folder,
            )
            .await;

            let line = match result {
                Ok(file_stats) => {
                    log_file_complete(&name, &file_stats);
                    stats.merge(&file_stats);
                    format!(
                        "文件 {}: 成功 {}, 尽力而为 {}, 失败 {}",
                        name, file_stats.completed, file_stats.best_effort, file_stats.failed
                    )
                }
                Err(e) => {
                    error!("[文件 {}] ❌ 处理过程中发生错误: {:#}", name, e);
                    format!("文件 {}: 处理失败: {:#}", name, e)
                }
            };

            if let Err(e) = append_log_line(&self.config.output_log_file, &line) {
                warn!("⚠️ 写入日志文件失败: {:#}", e);
            }
        }

        stats
    }
}
