//! 任务处理上下文
//!
//! 封装"我正在处理哪个文件的第几个任务"这一信息

use std::fmt::Display;

/// 任务处理上下文
#[derive(Debug, Clone)]
pub struct TaskCtx {
    /// 任务文件名（不含扩展名）
    pub file_name: String,

    /// 任务在文件中的序号（从1开始）
    pub task_index: usize,

    /// 任务类型
    pub kind: &'static str,
}

impl TaskCtx {
    pub fn new(file_name: impl Into<String>, task_index: usize, kind: &'static str) -> Self {
        Self {
            file_name: file_name.into(),
            task_index,
            kind,
        }
    }
}

impl Display for TaskCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文件 {} 任务#{} {}]",
            self.file_name, self.task_index, self.kind
        )
    }
}
