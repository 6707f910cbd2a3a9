//! 结构化输出调用器
//!
//! 包装 `RawGenerator`，保证调用方拿到的要么是通过校验的结构化结果，
//! 要么是调用方自己给定的默认结果。
//!
//! 流程：
//! 1. 第 1 次原样发送提示词
//! 2. 解码 → 字段校验 → 反序列化 → 语义检查（可选），任一步失败即本次失败
//! 3. 内容失败后发送严格格式提示：上次失败原因 + 原始指令 + JSON 骨架
//! 4. 传输层失败（没拿到文本）时原样重发上一次的请求
//! 5. 次数用尽后返回默认结果（不是错误）

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::infrastructure::RawGenerator;
use crate::structured::decode::{decode_json, DecodeFailure};
use crate::structured::schema::{check, OutputSchema, SchemaViolation};
use crate::utils::logging::truncate_text;

/// 默认的最大尝试次数（含首次）
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// 来自生成器并通过了校验
    Generated,
    /// 所有尝试失败后的默认结果
    Fallback,
    /// 无需调用生成器，直接返回的结果
    Skipped,
}

/// 结构化调用的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T> {
    pub value: T,
    /// 实际调用生成器的次数
    pub attempts: u32,
    pub source: ReplySource,
}

impl<T> Structured<T> {
    pub fn is_fallback(&self) -> bool {
        self.source == ReplySource::Fallback
    }

    pub fn is_skipped(&self) -> bool {
        self.source == ReplySource::Skipped
    }

    /// 不调用生成器，直接给出结果
    pub fn skipped(value: T) -> Self {
        Self {
            value,
            attempts: 0,
            source: ReplySource::Skipped,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Structured<U> {
        Structured {
            value: f(self.value),
            attempts: self.attempts,
            source: self.source,
        }
    }
}

/// 拿到文本后，内容不可用的原因
///
/// 传输层错误不在这里：它们不会写进发给模型的提示词。
#[derive(Debug)]
enum AttemptFailure {
    Decode(DecodeFailure),
    Schema(SchemaViolation),
    Deserialize(String),
    Rejected(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Decode(e) => write!(f, "{}", e),
            AttemptFailure::Schema(e) => write!(f, "{}", e),
            AttemptFailure::Deserialize(e) => write!(f, "字段内容不符合要求: {}", e),
            AttemptFailure::Rejected(e) => write!(f, "内容不合理: {}", e),
        }
    }
}

/// 结构化输出调用器
///
/// 不持有跨请求的可变状态，可以在多个并发任务间共享。
#[derive(Clone)]
pub struct StructuredOutputCaller {
    generator: Arc<dyn RawGenerator>,
    max_attempts: u32,
}

impl StructuredOutputCaller {
    /// `max_attempts` 小于 1 时按 1 处理
    pub fn new(generator: Arc<dyn RawGenerator>, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 调用生成器并解析为 `T`
    ///
    /// 解析或校验失败不会返回错误：用尽次数后返回 `fallback`。
    /// 只有当每一次尝试都在传输层失败（从未拿到任何文本）时才返回
    /// `LlmError::GeneratorUnavailable`。
    pub async fn call<T>(
        &self,
        prompt: &str,
        schema: &OutputSchema,
        fallback: T,
    ) -> Result<Structured<T>, LlmError>
    where
        T: DeserializeOwned + Serialize + Send,
    {
        self.call_checked(prompt, schema, fallback, |_: &T| Ok(()))
            .await
    }

    /// 同 [`call`](Self::call)，另外对反序列化后的值做语义检查
    ///
    /// `accept` 返回 `Err(原因)` 时视为本次失败，原因会写进下一次的提示词。
    /// `fallback` 本身必须满足 `schema`。
    pub async fn call_checked<T, F>(
        &self,
        prompt: &str,
        schema: &OutputSchema,
        fallback: T,
        accept: F,
    ) -> Result<Structured<T>, LlmError>
    where
        T: DeserializeOwned + Serialize + Send,
        F: Fn(&T) -> Result<(), String> + Send + Sync,
    {
        if prompt.trim().is_empty() {
            return Err(LlmError::EmptyPrompt);
        }

        debug_assert!(
            serde_json::to_value(&fallback)
                .map(|value| check(&value, schema).is_ok())
                .unwrap_or(false),
            "默认结果不满足字段要求"
        );

        let mut content_failure: Option<AttemptFailure> = None;
        let mut transport_error: Option<LlmError> = None;
        let mut reached_generator = false;

        for attempt in 1..=self.max_attempts {
            let request = match &content_failure {
                None => prompt.to_string(),
                Some(failure) => build_strict_prompt(prompt, schema, failure),
            };

            let raw = match self.generator.generate(&request).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        "第{}/{}次调用生成器失败: {}",
                        attempt, self.max_attempts, e
                    );
                    transport_error = Some(e);
                    continue;
                }
            };

            reached_generator = true;
            debug!(
                "第{}次响应 ({}): {}",
                attempt,
                self.generator.name(),
                truncate_text(&raw, 200)
            );

            match parse_reply(&raw, schema, &accept) {
                Ok(value) => {
                    debug!("第{}次结构化解析成功", attempt);
                    return Ok(Structured {
                        value,
                        attempts: attempt,
                        source: ReplySource::Generated,
                    });
                }
                Err(failure) => {
                    warn!(
                        "第{}/{}次结构化解析失败: {}",
                        attempt, self.max_attempts, failure
                    );
                    content_failure = Some(failure);
                }
            }
        }

        if !reached_generator {
            return Err(LlmError::GeneratorUnavailable {
                attempts: self.max_attempts,
                last_error: transport_error.map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        warn!(
            "所有{}次结构化解析尝试均失败，返回默认结果",
            self.max_attempts
        );
        Ok(Structured {
            value: fallback,
            attempts: self.max_attempts,
            source: ReplySource::Fallback,
        })
    }
}

fn parse_reply<T, F>(raw: &str, schema: &OutputSchema, accept: &F) -> Result<T, AttemptFailure>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<(), String>,
{
    let decoded = decode_json(raw).map_err(AttemptFailure::Decode)?;
    check(&decoded, schema).map_err(AttemptFailure::Schema)?;
    let value: T = serde_json::from_value(decoded)
        .map_err(|e| AttemptFailure::Deserialize(e.to_string()))?;
    accept(&value).map_err(AttemptFailure::Rejected)?;
    Ok(value)
}

fn build_strict_prompt(
    original: &str,
    schema: &OutputSchema,
    failure: &AttemptFailure,
) -> String {
    format!(
        r#"上一次的响应无法使用（{}）。

请重新回答下面的问题：
{}

请严格按照以下JSON格式返回结果，只输出这一个JSON对象，不要包含任何其他文字说明或代码块标记：
{}"#,
        failure,
        original,
        schema.format_hint()
    )
}
