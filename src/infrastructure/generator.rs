//! 文本生成器 - 基础设施层
//!
//! 只暴露"给一段提示词，拿回一段文本"的能力

use async_trait::async_trait;

use crate::error::LlmError;

/// 原始文本生成器
///
/// 职责：
/// - 接收提示词，返回原始文本
/// - 不做 JSON 解析，不做字段校验
/// - 返回的文本可能格式错误或语义错误，由上层负责兜底
/// - 网络、超时等传输层错误以 `LlmError` 返回
///
/// 实现必须是无状态的（或内部自行同步），同一个实例会被多个并发任务共享。
#[async_trait]
pub trait RawGenerator: Send + Sync {
    /// 生成文本
    ///
    /// 流式实现必须在返回前把所有分片拼接成完整文本。
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// 生成器名称（仅用于日志）
    fn name(&self) -> &str {
        "generator"
    }
}
