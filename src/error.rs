use thiserror::Error;

/// 应用程序错误类型
///
/// 只有"无法继续"的情况才会变成错误：解析失败、校验失败、语义驳回、
/// 重试耗尽都作为数据返回，不走这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 输入参数不合法
    #[error("输入错误: {0}")]
    InvalidInput(#[from] InputError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 序列化错误
    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// LLM 服务错误（即"生成器不可用"一类的传输层错误）
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 请求超时
    #[error("LLM请求超时 (模型: {model}, {timeout_secs}秒)")]
    Timeout { model: String, timeout_secs: u64 },
    /// 提示词为空
    #[error("提示词不能为空")]
    EmptyPrompt,
    /// 所有尝试都在传输层失败
    #[error("LLM服务不可用，{attempts}次尝试均失败: {last_error}")]
    GeneratorUnavailable { attempts: u32, last_error: String },
    /// 脚本化生成器没有剩余回复或被设定为失败
    #[error("脚本化生成器失败: {0}")]
    Script(String),
}

/// 输入参数错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 字段过短
    #[error("字段 {field} 至少需要 {min} 个字符")]
    TooShort { field: &'static str, min: usize },
    /// 缺少必填字段
    #[error("缺少字段 {field}")]
    Missing { field: &'static str },
    /// 数值超出范围
    #[error("字段 {field} 的值 {value} 超出范围 [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项必须为正数
    #[error("配置项 {var_name} 必须大于0")]
    MustBePositive { var_name: String },
    /// 配置项超出范围
    #[error("配置项 {var_name} 的值 {value} 超出范围 [{min}, {max}]")]
    OutOfRange {
        var_name: String,
        value: u64,
        min: u64,
        max: u64,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 是否为生成器不可用（传输层）错误
    pub fn is_generator_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::Llm(LlmError::GeneratorUnavailable { .. })
        )
    }
}

impl LlmError {
    /// 创建LLM API调用错误
    pub fn api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
