use axum::{
	extract::Request,
	http::header,
	middleware::Next,
	response::{IntoResponse, Response},
};
use chrono::Utc;
use sqlx::PgPool;
use tower_cookies::cookie::{Cookie, CookieJar, Key};

use crate::error::{AppError, PublicError};

/// Inserted into request extensions on authenticated requests
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
	pub id: i32,
}

fn unauthorized() -> Response {
	AppError::from(PublicError::Unauthorized).into_response()
}

/// Auth middleware for every protected route
/// - Decrypts the `auth-token` private cookie using the `Key` from extensions
///   (the key is derived from configuration, never generated in place)
/// - Validates the embedded expiration and that the account exists
/// - Inserts `AuthUser` into request extensions on success; otherwise 401
pub async fn middleware_auth(mut req: Request, next: Next) -> Response {
	let Some(key) = req.extensions().get::<Key>().cloned() else {
		return unauthorized();
	};
	let Some(pool) = req.extensions().get::<PgPool>().cloned() else {
		return unauthorized();
	};

	let Some(cookie_header) = req.headers().get(header::COOKIE) else {
		return unauthorized();
	};
	let Ok(cookie_str) = cookie_header.to_str() else {
		return unauthorized();
	};

	// Build a jar from incoming cookies
	let mut jar = CookieJar::new();
	for pair in cookie_str.split(';') {
		let s = pair.trim();
		if s.is_empty() {
			continue;
		}
		if let Ok(parsed) = Cookie::parse(s.to_string()) {
			jar.add(parsed);
		}
	}

	// Decrypt the private cookie and pull the token apart.
	let Some(decrypted) = jar.private(&key).get("auth-token") else {
		return unauthorized();
	};
	let Some((user_id, exp)) = parse_token(decrypted.value()) else {
		return unauthorized();
	};
	if Utc::now().timestamp() > exp {
		return unauthorized();
	}

	// Ensure the account still exists
	let exists =
		sqlx::query_as::<_, (bool,)>("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
			.bind(user_id)
			.fetch_one(&pool)
			.await
			.map(|row| row.0)
			.unwrap_or(false);
	if !exists {
		return unauthorized();
	}

	req.extensions_mut().insert(AuthUser { id: user_id });
	next.run(req).await
}

/// Derives the private-cookie key from the configured secret. Centralized so
/// test helpers mint cookies exactly the way the middleware reads them. The
/// secret must be at least 64 bytes.
pub fn cookie_key(secret: &str) -> Key {
	Key::derive_from(secret.as_bytes())
}

/// Token format: `user-<id>.<exp>.sign`, `<exp>` in epoch seconds (UTC).
/// Returns the account id and expiration, or None for anything malformed.
fn parse_token(token: &str) -> Option<(i32, i64)> {
	let parts: Vec<&str> = token.split('.').collect();
	if parts.len() != 3 || parts[2] != "sign" {
		return None;
	}
	let id = parts[0].strip_prefix("user-")?.parse::<i32>().ok()?;
	let exp = parts[1].parse::<i64>().ok()?;
	Some((id, exp))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn well_formed_token_parses() {
		assert_eq!(parse_token("user-42.1790000000.sign"), Some((42, 1_790_000_000)));
	}

	#[test]
	fn malformed_tokens_are_rejected() {
		assert_eq!(parse_token(""), None);
		assert_eq!(parse_token("user-42.1790000000"), None);
		assert_eq!(parse_token("user-42.1790000000.forged"), None);
		assert_eq!(parse_token("admin-42.1790000000.sign"), None);
		assert_eq!(parse_token("user-notanumber.1790000000.sign"), None);
		assert_eq!(parse_token("user-42.never.sign"), None);
		assert_eq!(parse_token("user-42.179.0.sign"), None);
	}
}
