//! 脚本化生成器
//!
//! 按顺序回放预先准备好的回复，并记录收到的每一条提示词。
//! 用于测试和离线演练，不访问网络。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::infrastructure::generator::RawGenerator;

/// 一条预设回复
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// 返回这段文本
    Text(String),
    /// 模拟传输层失败
    Unavailable(String),
}

/// 脚本化生成器
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由一组文本回复创建
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for text in texts {
            generator.push_text(text);
        }
        generator
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(ScriptedReply::Text(text.into()));
    }

    pub fn push_unavailable(&self, reason: impl Into<String>) {
        self.push(ScriptedReply::Unavailable(reason.into()));
    }

    pub fn push(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    /// 已经收到的调用次数
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// 收到的所有提示词（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// 尚未被消费的回复数量
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl RawGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());

        match lock(&self.replies).pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Unavailable(reason)) => Err(LlmError::Script(reason)),
            None => Err(LlmError::Script("没有剩余的预设回复".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// 持锁期间不会 panic，中毒的锁直接取回内部数据
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
