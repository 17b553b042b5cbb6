//! Answer synthesis for docrag.
//!
//! [`AnswerSynthesizer`] retrieves the chunks nearest to a question, assembles
//! them into a prompt and asks a [`LanguageModel`](docrag_core::LanguageModel)
//! for the answer. Plain mode returns only the answer; sourced mode also
//! returns the chunk ids and the context that was used.

pub mod llm;
pub mod prompt;
pub mod synthesizer;

pub use llm::{OllamaGenerator, DEFAULT_LLM_MODEL};
pub use prompt::{build_context, plain_prompt, sourced_prompt};
pub use synthesizer::{AnswerSynthesizer, DEFAULT_PLAIN_K, DEFAULT_SOURCED_K};
