//! API error taxonomy and error-body flattening.

use serde_json::Value;

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// 401 from any endpoint. The session token has already been cleared
  /// when this is returned.
  #[error("authentication required")]
  Unauthorized,

  /// 422 with a flattened validation detail.
  #[error("{0}")]
  Validation(String),

  /// Any other non-2xx response.
  #[error("HTTP {status}: {message}")]
  Server { status: u16, message: String },

  #[error("network: {0}")]
  Network(#[from] reqwest::Error),

  #[error("decode: {0}")]
  Decode(String),

  /// Cache storage failure while completing an invalidation group.
  #[error("cache: {0}")]
  Cache(String),
}

/// Flatten an error response body into a single display string.
///
/// Bodies follow the `{detail: string | [{loc, msg, type}, ...]}`
/// convention. The fallback chain is: string detail, joined validation
/// array (`"loc: msg; loc: msg"`), JSON-stringified body, raw body
/// text, `"unknown error"`.
pub fn flatten_detail(body: &str) -> String {
  let value: Value = match serde_json::from_str(body) {
    Ok(value) => value,
    Err(_) => {
      let trimmed = body.trim();
      return if trimmed.is_empty() {
        "unknown error".to_string()
      } else {
        trimmed.to_string()
      };
    }
  };

  match value.get("detail") {
    Some(Value::String(detail)) => detail.clone(),
    Some(Value::Array(entries)) => {
      let joined = entries
        .iter()
        .map(flatten_validation_entry)
        .collect::<Vec<_>>()
        .join("; ");
      if joined.is_empty() {
        "unknown error".to_string()
      } else {
        joined
      }
    }
    Some(other) => other.to_string(),
    None => value.to_string(),
  }
}

/// Render one `{loc, msg, type}` validation entry as `"loc: msg"`.
fn flatten_validation_entry(entry: &Value) -> String {
  let loc = entry.get("loc").and_then(Value::as_array).map(|parts| {
    parts
      .iter()
      .map(|part| match part {
        Value::String(s) => s.clone(),
        other => other.to_string(),
      })
      .collect::<Vec<_>>()
      .join(".")
  });
  let msg = entry.get("msg").and_then(Value::as_str);

  match (loc, msg) {
    (Some(loc), Some(msg)) => format!("{}: {}", loc, msg),
    (None, Some(msg)) => msg.to_string(),
    _ => entry.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_string_detail() {
    assert_eq!(flatten_detail(r#"{"detail": "device not found"}"#), "device not found");
  }

  #[test]
  fn test_validation_array_joins_loc_and_msg() {
    let body = r#"{"detail": [
      {"loc": ["body", "port"], "msg": "ensure this value is less than or equal to 65535", "type": "value_error"},
      {"loc": ["body", "host"], "msg": "field required", "type": "value_error.missing"}
    ]}"#;
    assert_eq!(
      flatten_detail(body),
      "body.port: ensure this value is less than or equal to 65535; body.host: field required"
    );
  }

  #[test]
  fn test_unexpected_detail_is_stringified() {
    assert_eq!(flatten_detail(r#"{"detail": {"code": 7}}"#), r#"{"code":7}"#);
  }

  #[test]
  fn test_body_without_detail_is_stringified() {
    assert_eq!(flatten_detail(r#"{"error": "nope"}"#), r#"{"error":"nope"}"#);
  }

  #[test]
  fn test_non_json_body_is_returned_verbatim() {
    assert_eq!(flatten_detail("Bad Gateway"), "Bad Gateway");
  }

  #[test]
  fn test_empty_body_falls_back() {
    assert_eq!(flatten_detail(""), "unknown error");
    assert_eq!(flatten_detail("   "), "unknown error");
  }
}
