//! 单个任务文件处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **展开任务**：把 `TaskFile` 展开成 `Vec<Task>`
//! 2. **并发调度**：共享 Semaphore，每个任务一个 tokio 任务
//! 3. **超时控制**：超时即丢弃任务 future，不再发起后续调用
//! 4. **结果落盘**：写出 `<文件名>.result.json`
//! 5. **统计输出**：记录成功 / 尽力而为 / 失败数量

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::models::response::CODE_INTERNAL;
use crate::models::{StandardResponse, TaskFile};
use crate::utils::logging::RunStats;
use crate::workflow::{TaskCtx, TaskFlow, TaskReport, TaskStatus};

/// 结果文件中的一条记录
#[derive(Debug, Clone, Serialize)]
pub struct TaskResultEntry {
    /// 任务序号（从1开始）
    pub index: usize,
    pub kind: &'static str,
    pub status: TaskStatus,
    pub response: StandardResponse,
}

/// 处理单个任务文件
///
/// # 参数
/// - `flow`: 共享的任务流程
/// - `task_file`: 任务文件
/// - `semaphore`: 全局并发许可
/// - `task_timeout`: 单个任务的超时时间
/// - `output_folder`: 结果文件目录
///
/// # 返回
/// 返回本文件的统计信息
pub async fn process_file(
    flow: Arc<TaskFlow>,
    task_file: TaskFile,
    semaphore: Arc<Semaphore>,
    task_timeout: Duration,
    output_folder: &str,
) -> Result<RunStats> {
    let name = task_file.name();
    let tasks = task_file.into_tasks();

    let mut slots = Vec::with_capacity(tasks.len());
    let mut handles = Vec::with_capacity(tasks.len());
    for (idx, task) in tasks.into_iter().enumerate() {
        let task_index = idx + 1;
        let kind = task.kind();
        let permit = semaphore.clone().acquire_owned().await?;
        let flow = flow.clone();
        let ctx = TaskCtx::new(name.clone(), task_index, kind);

        let handle = tokio::spawn(async move {
            let _permit = permit;
            match tokio::time::timeout(task_timeout, flow.run(task, &ctx)).await {
                Ok(report) => report,
                Err(_) => {
                    warn!("{} ⏱️ 处理超时，已放弃", ctx);
                    TaskReport::failed(StandardResponse::timeout(task_timeout.as_secs()))
                }
            }
        });
        slots.push((task_index, kind));
        handles.push(handle);
    }

    let mut stats = RunStats::default();
    let mut entries = Vec::with_capacity(handles.len());

    // 结果按任务在文件中的顺序排列
    for ((index, kind), joined) in slots.into_iter().zip(join_all(handles).await) {
        let report = match joined {
            Ok(report) => report,
            Err(e) => {
                error!("[文件 {} 任务#{}] 任务执行失败: {}", name, index, e);
                TaskReport::failed(StandardResponse::failure(
                    CODE_INTERNAL,
                    format!("任务执行失败: {}", e),
                ))
            }
        };

        match report.status {
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::BestEffort => stats.best_effort += 1,
            TaskStatus::Failed => stats.failed += 1,
        }
        entries.push(TaskResultEntry {
            index,
            kind,
            status: report.status,
            response: report.response,
        });
    }

    write_results(output_folder, &name, &entries).await?;
    Ok(stats)
}

/// 结果文件路径
pub fn result_path(output_folder: &str, name: &str) -> PathBuf {
    Path::new(output_folder).join(format!("{}.result.json", name))
}

async fn write_results(output_folder: &str, name: &str, entries: &[TaskResultEntry]) -> Result<()> {
    tokio::fs::create_dir_all(output_folder)
        .await
        .with_context(|| format!("无法创建输出目录: {}", output_folder))?;

    let path = result_path(output_folder, name);
    let content = serde_json::to_string_pretty(entries).context("无法序列化处理结果")?;
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("无法写入结果文件: {}", path.display()))?;
    Ok(())
}
