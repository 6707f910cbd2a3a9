use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;

use crate::config::Config;

/// 运行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// 正常完成
    pub completed: usize,
    /// 次数用尽或使用兜底结果
    pub best_effort: usize,
    /// 失败
    pub failed: usize,
}

impl RunStats {
    pub fn total(&self) -> usize {
        self.completed + self.best_effort + self.failed
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.completed += other.completed;
        self.best_effort += other.best_effort;
        self.failed += other.failed;
    }
}

/// 初始化日志文件（覆盖写入文件头）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n考试智能体运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 向日志文件追加一行（带时间戳）
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;
    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        line
    )
    .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 结构化输出任务处理");
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!("📊 最大并发数: {}", config.max_concurrent_tasks);
    info!(
        "🔁 JSON 重试次数: {}, 默认修正轮数: {}",
        config.max_json_retry_attempts, config.max_fix_attempts
    );
    info!("{}", "=".repeat(60));
}

/// 记录任务文件加载信息
pub fn log_files_loaded(file_count: usize, task_count: usize) {
    info!("✓ 找到 {} 个任务文件，共 {} 个任务", file_count, task_count);
}

/// 记录单个任务文件开始处理
pub fn log_file_start(file_index: usize, total_files: usize, name: &str, task_count: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 个文件: {}", file_index, total_files, name);
    info!("📄 任务数: {}", task_count);
    info!("{}", "=".repeat(60));
}

/// 记录单个任务文件处理完成
pub fn log_file_complete(name: &str, stats: &RunStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 文件 {} 完成: 成功 {}, 尽力而为 {}, 失败 {} / 共 {}",
        name,
        stats.completed,
        stats.best_effort,
        stats.failed,
        stats.total()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.completed, stats.total());
    info!("⚠️ 次数用尽/兜底: {}", stats.best_effort);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// 按字符截断，不会切断多字节字符
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
