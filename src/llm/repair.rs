/*
 * src/llm/repair.rs
 *
 * File for LLM response repair
 *
 * Purpose:
 *   Models wrap JSON in Markdown fences or chatter around it. Repair slices
 *   out the outermost object (first `{` to last `}`) and re-parses, falling
 *   back to JSON5 for almost-JSON (trailing commas, single quotes).
 */

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::llm::LlmError;

/// Returns the substring from the first `{` to the last `}` inclusive.
/// Code fences and surrounding prose fall away for free.
pub fn extract_json_object(raw: &str) -> Result<&str, LlmError> {
	let start = raw.find('{');
	let end = raw.rfind('}');
	match (start, end) {
		(Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
		_ => Err(LlmError::Parse {
			raw: raw.to_string(),
		}),
	}
}

/// Repairs and parses a raw model response into a JSON value.
pub fn parse_object(raw: &str) -> Result<Value, LlmError> {
	let inner = extract_json_object(raw)?;
	if let Ok(v) = serde_json::from_str::<Value>(inner) {
		return Ok(v);
	}
	json5::from_str::<Value>(inner).map_err(|_| LlmError::Parse {
		raw: raw.to_string(),
	})
}

/// Repairs, parses, and shapes a raw response into `T`. A parseable object
/// that misses required fields is a schema failure, not a parse failure.
pub fn parse_typed<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
	let value = parse_object(raw)?;
	serde_json::from_value(value).map_err(|e| LlmError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fenced_object_yields_byte_equal_inner() {
		let raw = "```json\n{\"a\": 1}\n```";
		assert_eq!(extract_json_object(raw).unwrap(), "{\"a\": 1}");
	}

	#[test]
	fn noisy_object_yields_byte_equal_inner() {
		let raw = "noise {\"a\": 1} trailing";
		assert_eq!(extract_json_object(raw).unwrap(), "{\"a\": 1}");
	}

	#[test]
	fn bare_object_is_identity() {
		let raw = "{\"a\": 1}";
		assert_eq!(extract_json_object(raw).unwrap(), raw);
	}

	#[test]
	fn no_braces_is_a_parse_error() {
		let err = extract_json_object("no braces here").unwrap_err();
		match err {
			LlmError::Parse { raw } => assert_eq!(raw, "no braces here"),
			other => panic!("expected Parse, got {other:?}"),
		}
	}

	#[test]
	fn json5_fallback_accepts_trailing_commas() {
		let raw = "{\"name\": \"Louvre\", \"tags\": [\"art\",],}";
		let v = parse_object(raw).unwrap();
		assert_eq!(v["name"], "Louvre");
	}

	#[test]
	fn typed_parse_reports_schema_errors() {
		#[derive(serde::Deserialize, Debug)]
		struct Needs {
			#[allow(dead_code)]
			name: String,
		}
		let err = parse_typed::<Needs>("{\"nom\": \"x\"}").unwrap_err();
		assert!(matches!(err, LlmError::Schema(_)));
	}

	#[test]
	fn nested_braces_survive_extraction() {
		let raw = "prefix {\"outer\": {\"inner\": 2}} suffix";
		assert_eq!(extract_json_object(raw).unwrap(), "{\"outer\": {\"inner\": 2}}");
	}
}
