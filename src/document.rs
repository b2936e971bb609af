//! Plain-text extraction from stored note bodies.
//!
//! Note bodies may be serialized rich-text documents (nested `content` arrays
//! with `text` leaves, as produced by document-model editors). The engine only
//! ever consumes the flattened text: all leaves concatenated depth-first,
//! space-separated, order-preserving.
//!
//! Extraction is total. A body that is not valid JSON is treated as
//! already-plain text; a valid document with no text leaves yields the empty
//! string. A corrupt note must never block transcript reconstruction.

use serde_json::Value;

/// Flatten a stored body into plain text.
pub fn extract_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s.trim().to_string(),
        Ok(doc) => {
            let mut out = String::new();
            collect_text(&doc, &mut out);
            out
        }
        Err(_) => body.trim().to_string(),
    }
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}
