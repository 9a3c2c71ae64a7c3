/*
 * src/llm/mod.rs
 *
 * File for the LLM gateway module
 *
 * Purpose:
 *   Everything that talks to the model vendor: prompt templates, the
 *   backend trait with its OpenAI and canned implementations, JSON repair,
 *   and the typed gateway the orchestrator calls.
 */

pub mod gateway;
pub mod prompts;
pub mod repair;
pub mod schema;

pub use gateway::{LlmBackend, LlmGateway, RoundTrip};
pub use prompts::{PromptKind, RenderedPrompt};

use crate::error::{AppError, PublicError};

/// Failure modes of a single LLM round-trip. The gateway never retries;
/// the orchestrator decides what a failure means for the request.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
	/// Transport-level failure talking to the vendor.
	#[error("llm unavailable: {0}")]
	Unavailable(String),
	/// The response held no parseable JSON object. Raw text is kept for the
	/// interaction journal.
	#[error("llm response was not valid JSON")]
	Parse { raw: String },
	/// Parsed JSON that does not satisfy the template's expected shape.
	#[error("llm response did not match the expected schema: {0}")]
	Schema(String),
	#[error("llm call exceeded its deadline")]
	Timeout,
}

impl LlmError {
	/// Short tag recorded in the journal's `error_tag` column.
	pub fn tag(&self) -> &'static str {
		match self {
			LlmError::Unavailable(_) => "unavailable",
			LlmError::Parse { .. } => "parse_error",
			LlmError::Schema(_) => "schema_error",
			LlmError::Timeout => "timeout",
		}
	}
}

impl From<LlmError> for AppError {
	fn from(e: LlmError) -> Self {
		match e {
			LlmError::Timeout => AppError::Public(PublicError::Timeout),
			other => AppError::Public(PublicError::UpstreamLlm(other.to_string())),
		}
	}
}

/// Per-call generation knobs; each template carries its own defaults.
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
	pub temperature: f32,
	pub max_tokens: u32,
}
