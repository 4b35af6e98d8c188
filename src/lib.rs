pub mod config;
pub mod doc_processor;
pub mod docx_writer;
pub mod llm;

pub use config::{LlmConfig, RetryPolicy};
pub use doc_processor::{convert_directory, Block, ConversionJob, ConvertError};
pub use llm::{ChatClient, ChatMessage, Completion, LlmError, Role};
