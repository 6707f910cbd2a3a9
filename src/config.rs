use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppResult, ConfigError};
use crate::models::question::{MAX_FIX_ATTEMPTS, MIN_FIX_ATTEMPTS};

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// 单次 LLM 请求超时（秒）
    pub llm_request_timeout_secs: u64,
    // --- 重试预算 ---
    /// 结构化输出的最大尝试次数（含首次）
    pub max_json_retry_attempts: u32,
    /// 核查-修正循环的最大核查次数
    pub max_fix_attempts: u32,
    // --- 批处理 ---
    /// 同时处理的任务数量
    pub max_concurrent_tasks: usize,
    /// 单个任务的总超时（秒），超时后放弃剩余尝试
    pub task_timeout_secs: u64,
    /// 任务 TOML 文件存放目录
    pub task_folder: String,
    /// 结果输出目录
    pub output_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.deepseek.com".to_string(),
            llm_model_name: "deepseek-chat".to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 2048,
            llm_request_timeout_secs: 120,
            max_json_retry_attempts: 3,
            max_fix_attempts: 3,
            max_concurrent_tasks: 8,
            task_timeout_secs: 900,
            task_folder: "tasks".to_string(),
            output_folder: "results".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    ///
    /// 已设置但无法解析的值会报错，而不是静默回退到默认值。
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();
        let config = Self {
            llm_api_key: env_string("LLM_API_KEY", default.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL", default.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME", default.llm_model_name),
            llm_temperature: env_parse("LLM_TEMPERATURE", default.llm_temperature)?,
            llm_max_tokens: env_parse("LLM_MAX_TOKENS", default.llm_max_tokens)?,
            llm_request_timeout_secs: env_parse(
                "LLM_REQUEST_TIMEOUT_SECS",
                default.llm_request_timeout_secs,
            )?,
            max_json_retry_attempts: env_parse(
                "MAX_JSON_RETRY_ATTEMPTS",
                default.max_json_retry_attempts,
            )?,
            max_fix_attempts: env_parse("MAX_FIX_ATTEMPTS", default.max_fix_attempts)?,
            max_concurrent_tasks: env_parse("MAX_CONCURRENT_TASKS", default.max_concurrent_tasks)?,
            task_timeout_secs: env_parse("TASK_TIMEOUT_SECS", default.task_timeout_secs)?,
            task_folder: env_string("TASK_FOLDER", default.task_folder),
            output_folder: env_string("OUTPUT_FOLDER", default.output_folder),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging)?,
            output_log_file: env_string("OUTPUT_LOG_FILE", default.output_log_file),
        };
        config.validate()?;
        Ok(config)
    }

    /// 检查配置项取值
    pub fn validate(&self) -> AppResult<()> {
        let positives: [(&str, u64); 4] = [
            ("MAX_JSON_RETRY_ATTEMPTS", self.max_json_retry_attempts as u64),
            ("MAX_CONCURRENT_TASKS", self.max_concurrent_tasks as u64),
            ("LLM_REQUEST_TIMEOUT_SECS", self.llm_request_timeout_secs),
            ("TASK_TIMEOUT_SECS", self.task_timeout_secs),
        ];
        for (var_name, value) in positives {
            if value == 0 {
                return Err(ConfigError::MustBePositive {
                    var_name: var_name.to_string(),
                }
                .into());
            }
        }

        if !(MIN_FIX_ATTEMPTS..=MAX_FIX_ATTEMPTS).contains(&self.max_fix_attempts) {
            return Err(ConfigError::OutOfRange {
                var_name: "MAX_FIX_ATTEMPTS".to_string(),
                value: self.max_fix_attempts as u64,
                min: MIN_FIX_ATTEMPTS as u64,
                max: MAX_FIX_ATTEMPTS as u64,
            }
            .into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_request_timeout_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

fn env_string(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let config = Config::default();
        assert_eq!(config.max_json_retry_attempts, 3);
        assert_eq!(config.max_fix_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = Config {
            max_fix_attempts: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MAX_FIX_ATTEMPTS"));

        let config = Config {
            max_fix_attempts: 6,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_concurrent_tasks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_parse_reports_bad_value() {
        std::env::set_var("EXAM_AGENT_TEST_BAD_NUMBER", "三次");
        let result: AppResult<u32> = env_parse("EXAM_AGENT_TEST_BAD_NUMBER", 3);
        std::env::remove_var("EXAM_AGENT_TEST_BAD_NUMBER");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_parse_missing_uses_default() {
        let value: u32 = env_parse("EXAM_AGENT_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
