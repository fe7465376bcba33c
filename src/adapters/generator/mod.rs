//! Content generator adapters.
//!
//! - `OpenAIGenerator` - chat-completion backend (OpenAI-compatible APIs)
//! - `MockContentGenerator` - deterministic replies for tests and local runs

mod mock_generator;
mod openai_generator;
mod prompts;

pub use mock_generator::MockContentGenerator;
pub use openai_generator::{extract_json_block, OpenAIGenerator, OpenAIGeneratorConfig};
