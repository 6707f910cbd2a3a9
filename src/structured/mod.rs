pub mod caller;
pub mod decode;
pub mod schema;

pub use caller::{ReplySource, Structured, StructuredOutputCaller, DEFAULT_MAX_ATTEMPTS};
pub use decode::{decode_json, DecodeFailure};
pub use schema::{check, validate, FieldKind, FieldSpec, OutputSchema, SchemaViolation};
