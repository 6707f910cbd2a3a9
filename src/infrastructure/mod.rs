pub mod generator;
pub mod openai;
pub mod scripted;

pub use generator::RawGenerator;
pub use openai::OpenAiGenerator;
pub use scripted::{ScriptedGenerator, ScriptedReply};
