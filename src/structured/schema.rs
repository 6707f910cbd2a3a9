//! 字段校验
//!
//! 校验解码后的 JSON 是否包含要求的字段，以及字段类型是否正确。
//! 只返回结果，不决定是否重试。

use std::fmt;

use serde_json::{Map, Value as JsonValue};

/// 字段的基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
}

impl FieldKind {
    fn matches(self, value: &JsonValue) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
        }
    }

    /// 写进格式提示里的占位值
    fn placeholder(self) -> &'static str {
        match self {
            FieldKind::String => "\"<字符串>\"",
            FieldKind::Boolean => "true/false",
            FieldKind::Integer => "<整数>",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "字符串"),
            FieldKind::Boolean => write!(f, "布尔值"),
            FieldKind::Integer => write!(f, "整数"),
        }
    }
}

/// 单个字段的要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// 为 true 时允许缺失或为 null
    pub optional: bool,
}

/// 结构化输出的字段集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSchema {
    fields: Vec<FieldSpec>,
}

impl OutputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind, optional: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            optional,
        });
        self
    }

    pub fn string(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::String, false)
    }

    pub fn optional_string(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::String, true)
    }

    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Boolean, false)
    }

    pub fn integer(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Integer, false)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 生成 JSON 骨架，用于严格格式的重试提示
    ///
    /// ```
    /// use exam_agent::structured::OutputSchema;
    ///
    /// let schema = OutputSchema::new().boolean("is_compliant").string("suggestion");
    /// let hint = schema.format_hint();
    /// assert!(hint.contains("\"is_compliant\": true/false"));
    /// assert!(hint.contains("\"suggestion\": \"<字符串>\""));
    /// ```
    pub fn format_hint(&self) -> String {
        let lines: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                let placeholder = if field.optional {
                    format!("{} 或 null", field.kind.placeholder())
                } else {
                    field.kind.placeholder().to_string()
                };
                format!("    \"{}\": {}", field.name, placeholder)
            })
            .collect();
        format!("{{\n{}\n}}", lines.join(",\n"))
    }
}

/// 校验失败的原因（只报告第一个问题）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    NotAnObject,
    MissingField(String),
    WrongKind {
        field: String,
        expected: FieldKind,
    },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::NotAnObject => write!(f, "响应不是JSON对象"),
            SchemaViolation::MissingField(field) => write!(f, "JSON响应缺少 '{}' 字段", field),
            SchemaViolation::WrongKind { field, expected } => {
                write!(f, "字段 '{}' 应为{}", field, expected)
            }
        }
    }
}

/// 校验并指出第一个不符合要求的地方
pub fn check(decoded: &JsonValue, schema: &OutputSchema) -> Result<(), SchemaViolation> {
    let object: &Map<String, JsonValue> =
        decoded.as_object().ok_or(SchemaViolation::NotAnObject)?;

    for field in schema.fields() {
        match object.get(&field.name) {
            None | Some(JsonValue::Null) if field.optional => {}
            None | Some(JsonValue::Null) => {
                return Err(SchemaViolation::MissingField(field.name.clone()));
            }
            Some(value) if !field.kind.matches(value) => {
                return Err(SchemaViolation::WrongKind {
                    field: field.name.clone(),
                    expected: field.kind,
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// 是否通过校验，多余字段会被忽略
pub fn validate(decoded: &JsonValue, schema: &OutputSchema) -> bool {
    check(decoded, schema).is_ok()
}
