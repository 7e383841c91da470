//! JSON glue between the page and the host.
//!
//! Every payload that crosses the bridge is JSON text. This module owns the
//! envelopes the page gets back and the pretty-printing used for saved games.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

const ECHO_PREFIX: &str = "Rust received: ";

/// Deepest array/object nesting accepted from the page. Parsing and
/// rendering recurse once per level, so this also bounds stack use.
pub const MAX_DEPTH: usize = 512;

/// Returned when an envelope itself cannot be rendered.
const FALLBACK_ERROR: &str = r#"{"error":"failed to encode response"}"#;

#[derive(Debug, Serialize)]
struct Processed {
    received: Value,
    timestamp: f64,
    processed: bool,
}

#[derive(Debug, Serialize)]
struct Failure<'a> {
    error: &'a str,
}

pub fn echo_reply(message: &str) -> String {
    format!("{ECHO_PREFIX}{message}")
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

/// Wraps a page payload in the result envelope, or the error envelope when
/// the payload is not JSON.
pub fn process_payload(json: &str) -> String {
    match parse_document(json) {
        Ok(received) => encode(&Processed {
            received,
            timestamp: unix_timestamp(),
            processed: true,
        }),
        Err(err) => error_envelope(&err.to_string()),
    }
}

pub fn error_envelope(message: &str) -> String {
    encode(&Failure { error: message })
}

/// Re-renders a JSON document with two-space indentation.
pub fn pretty_document(json: &str) -> Result<String> {
    let document = parse_document(json)?;
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parses any JSON document up to [`MAX_DEPTH`] levels deep. Numbers keep
/// their exact source text, so big integers and long decimals survive.
pub fn parse_document(json: &str) -> Result<Value> {
    let depth = nesting_depth(json);
    if depth > MAX_DEPTH {
        return Err(BridgeError::TooDeep {
            depth,
            limit: MAX_DEPTH,
        });
    }

    // The pre-scan above bounds recursion, so serde_json's own 128 cap goes.
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let document = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(document)
}

/// Deepest bracket nesting outside string literals. Stops counting once
/// past the limit; malformed input is left for the parser to reject.
fn nesting_depth(json: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
                if deepest > MAX_DEPTH {
                    break;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| FALLBACK_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn echo_prefixes_message() {
        assert_eq!(echo_reply("hello"), "Rust received: hello");
        assert_eq!(echo_reply(""), "Rust received: ");
        assert_eq!(echo_reply("ünï"), echo_reply("ünï"));
    }

    #[test]
    fn processed_envelope_keeps_payload() {
        let payload = json!({"score": 12, "player": {"x": 3, "y": [1, 2]}, "tags": null});
        let reply: Value = serde_json::from_str(&process_payload(&payload.to_string()))
            .expect("reply is json");

        assert_eq!(reply["received"], payload);
        assert_eq!(reply["processed"], json!(true));
        assert!(reply["timestamp"].as_f64().expect("timestamp") > 0.0);
        assert!(reply.get("error").is_none());
    }

    #[test]
    fn scalar_payloads_are_accepted() {
        for payload in ["42", "\"text\"", "[]", "null", "true"] {
            let reply: Value = serde_json::from_str(&process_payload(payload)).expect("json");
            assert_eq!(
                reply["received"],
                serde_json::from_str::<Value>(payload).expect("payload")
            );
        }
    }

    #[test]
    fn malformed_payload_yields_error_envelope() {
        for payload in ["", "{", "{'single': 1}", "[1, 2,]", "nope"] {
            let reply: Value = serde_json::from_str(&process_payload(payload)).expect("json");
            assert!(reply["error"].is_string(), "payload {payload:?}");
            assert!(reply.get("received").is_none());
            assert!(reply.get("processed").is_none());
        }
    }

    #[test]
    fn error_envelope_escapes_message() {
        let reply: Value = serde_json::from_str(&error_envelope("bad \"quote\"\n")).expect("json");
        assert_eq!(reply, json!({"error": "bad \"quote\"\n"}));
    }

    #[test]
    fn pretty_document_uses_two_space_indent_and_keeps_key_order() {
        let pretty = pretty_document(r#"{"zeta":1,"alpha":{"inner":[true]}}"#).expect("pretty");
        assert_eq!(
            pretty,
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"inner\": [\n      true\n    ]\n  }\n}"
        );
    }

    #[test]
    fn big_numbers_keep_their_exact_text() {
        let payload = r#"{"seed":123456789012345678901234567890,"ratio":0.1000000000000000055511151231257827}"#;
        let reply: Value = serde_json::from_str(&process_payload(payload)).expect("json");
        assert_eq!(reply["received"].to_string(), payload);

        assert_eq!(
            pretty_document(payload).expect("pretty"),
            "{\n  \"seed\": 123456789012345678901234567890,\n  \"ratio\": 0.1000000000000000055511151231257827\n}"
        );
    }

    #[test]
    fn deep_documents_within_limit_are_accepted() {
        let nested = format!("{}{}", "[".repeat(200), "]".repeat(200));
        let reply = parse_document(&process_payload(&nested)).expect("json");
        assert!(reply.get("error").is_none(), "reply {reply}");
        assert_eq!(reply["received"].to_string(), nested);

        let objects = format!("{}1{}", r#"{"a":"#.repeat(300), "}".repeat(300));
        assert!(pretty_document(&objects).is_ok());
    }

    #[test]
    fn nesting_past_limit_is_rejected() {
        let nested = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            parse_document(&nested),
            Err(BridgeError::TooDeep { limit: MAX_DEPTH, .. })
        ));
        let reply: Value = serde_json::from_str(&process_payload(&nested)).expect("json");
        assert!(reply["error"].as_str().expect("error").contains("nesting"));
    }

    #[test]
    fn brackets_inside_strings_do_not_count() {
        assert_eq!(nesting_depth(r#"["[[[", "\"{{"]"#), 1);
        assert_eq!(nesting_depth(r#"{"a": [{"b": []}]}"#), 4);
        assert_eq!(nesting_depth("42"), 0);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse_document("{} {}").is_err());
        assert!(parse_document("[1] x").is_err());
    }

    #[test]
    fn pretty_document_rejects_invalid_json() {
        assert!(pretty_document("{\"unterminated\": ").is_err());
    }
}
