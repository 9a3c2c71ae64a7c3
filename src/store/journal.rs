/*
 * src/store/journal.rs
 *
 * File for the interaction journal
 *
 * Purpose:
 *   Append-only audit of every LLM round-trip, written in its own
 *   transaction. Failed round-trips are recorded with an error tag and the
 *   raw response, and a journal write failure never masks the error that
 *   was being journaled.
 */

use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::warn;

use crate::error::ApiResult;
use crate::models::interaction::{Interaction, NewInteraction};
use crate::sql_models::interaction::InteractionRow;

fn prompt_hash(prompt: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(prompt.as_bytes());
	format!("{:x}", hasher.finalize())
}

/// Appends one record; the transaction is begun per write and committed on
/// success. Returns the interaction id that bookmarks can reference.
pub async fn record(pool: &PgPool, new: &NewInteraction) -> ApiResult<i64> {
	let mut tx = pool.begin().await?;
	let (id,) = sqlx::query_as::<_, (i64,)>(
		"INSERT INTO llm_interactions
		   (account_id, profile_id, kind, city_name, prompt_hash, prompt_text,
		    response_text, model_tag, prompt_tokens, completion_tokens, latency_ms, error_tag)
		 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
		 RETURNING id",
	)
	.bind(new.account_id)
	.bind(new.profile_id)
	.bind(new.kind.as_str())
	.bind(&new.city_name)
	.bind(prompt_hash(&new.prompt_text))
	.bind(&new.prompt_text)
	.bind(&new.response_text)
	.bind(&new.model_tag)
	.bind(new.prompt_tokens)
	.bind(new.completion_tokens)
	.bind(new.latency_ms)
	.bind(&new.error_tag)
	.fetch_one(&mut *tx)
	.await?;
	tx.commit().await?;
	Ok(id)
}

/// Journal write around an error path: log and move on if the append itself
/// fails, so the original failure is what surfaces.
pub async fn record_best_effort(pool: &PgPool, new: &NewInteraction) -> Option<i64> {
	match record(pool, new).await {
		Ok(id) => Some(id),
		Err(e) => {
			warn!(kind = new.kind.as_str(), "journal write failed: {e}");
			None
		}
	}
}

pub async fn fetch(pool: &PgPool, id: i64) -> ApiResult<Option<Interaction>> {
	let row = sqlx::query_as::<_, InteractionRow>(
		"SELECT id, account_id, profile_id, kind, city_name, prompt_hash, prompt_text,
		        response_text, model_tag, prompt_tokens, completion_tokens, latency_ms,
		        error_tag, created_at
		 FROM llm_interactions WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(pool)
	.await?;
	Ok(row.map(Interaction::from))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prompt_hash_is_stable_sha256_hex() {
		let h = prompt_hash("hello");
		assert_eq!(h.len(), 64);
		assert_eq!(h, prompt_hash("hello"));
		assert_ne!(h, prompt_hash("hello "));
	}
}
