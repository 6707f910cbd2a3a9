//! OpenAI 兼容接口的生成器 - 基础设施层
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 DeepSeek, DashScope 兼容模式等）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::infrastructure::generator::RawGenerator;

/// OpenAI 兼容生成器
///
/// 每次调用都是独立的一问一答，不保留对话历史。
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    system_message: Option<String>,
    request_timeout: Duration,
}

impl OpenAiGenerator {
    /// 创建新的生成器
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
            system_message: None,
            request_timeout: config.request_timeout(),
        }
    }

    /// 为每次请求附加系统消息
    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    fn build_messages(&self, prompt: &str) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = &self.system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()
                .map_err(|e| LlmError::api_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| LlmError::api_failed(&self.model_name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        Ok(messages)
    }

    async fn request(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(self.build_messages(prompt)?)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| LlmError::api_failed(&self.model_name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::api_failed(&self.model_name, e)
        })?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })
    }
}

#[async_trait]
impl RawGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            "调用 LLM API，模型: {}，提示词长度: {} 字符",
            self.model_name,
            prompt.chars().count()
        );

        match tokio::time::timeout(self.request_timeout, self.request(prompt)).await {
            Ok(result) => {
                if result.is_ok() {
                    debug!("LLM API 调用成功");
                }
                result
            }
            Err(_) => {
                warn!(
                    "LLM API 调用超时 ({} 秒)",
                    self.request_timeout.as_secs()
                );
                Err(LlmError::Timeout {
                    model: self.model_name.clone(),
                    timeout_secs: self.request_timeout.as_secs(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试通用 LLM 调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_generate_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_generate_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().expect("配置加载失败");
        let generator = OpenAiGenerator::new(&config)
            .with_system_message("你是一个简洁的助手，回答要简短。");

        let result = generator
            .generate(r#"只返回JSON：{"ok": true}"#)
            .await;

        match result {
            Ok(response) => {
                println!("LLM 响应: {}", response);
                assert!(!response.is_empty());
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }

    #[test]
    fn test_generator_name_is_model() {
        let config = Config {
            llm_model_name: "deepseek-chat".to_string(),
            ..Default::default()
        };
        let generator = OpenAiGenerator::new(&config);
        assert_eq!(generator.name(), "deepseek-chat");
        assert_eq!(generator.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_build_messages_with_system() {
        let generator =
            OpenAiGenerator::new(&Config::default()).with_system_message("你是考试专家");
        let messages = generator.build_messages("请核查").unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }
}
