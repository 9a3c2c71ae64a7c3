use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::models::interaction::Interaction;

#[derive(Debug, FromRow)]
pub struct InteractionRow {
	pub id: i64,
	pub account_id: Option<i32>,
	pub profile_id: Option<i32>,
	pub kind: String,
	pub city_name: Option<String>,
	pub prompt_hash: String,
	pub prompt_text: String,
	pub response_text: Option<String>,
	pub model_tag: String,
	pub prompt_tokens: Option<i32>,
	pub completion_tokens: Option<i32>,
	pub latency_ms: i64,
	pub error_tag: Option<String>,
	pub created_at: NaiveDateTime,
}

impl From<InteractionRow> for Interaction {
	fn from(row: InteractionRow) -> Self {
		Interaction {
			id: row.id,
			account_id: row.account_id,
			profile_id: row.profile_id,
			kind: row.kind,
			city_name: row.city_name,
			prompt_hash: row.prompt_hash,
			prompt_text: row.prompt_text,
			response_text: row.response_text,
			model_tag: row.model_tag,
			prompt_tokens: row.prompt_tokens,
			completion_tokens: row.completion_tokens,
			latency_ms: row.latency_ms,
			error_tag: row.error_tag,
			created_at: row.created_at,
		}
	}
}
