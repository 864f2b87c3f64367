//! Coerces untrusted remote documents into the strict `Pin` shape.

use serde_json::Value;

use crate::demo::CATEGORIES;
use crate::models::Pin;
use crate::traits::RemoteDocument;

const DEFAULT_W: u32 = 600;
const DEFAULT_H: u32 = 800;

/// Returns `None` for documents that cannot be shown (no object body, no image).
pub fn pin_from_document(doc: &RemoteDocument) -> Option<Pin> {
    let body = doc.data.as_object()?;
    let src = text(body.get("src"))?;
    if src.trim().is_empty() || doc.id.is_empty() {
        return None;
    }

    Some(Pin {
        id: doc.id.clone(),
        src,
        w: dimension(body.get("w")).unwrap_or(DEFAULT_W),
        h: dimension(body.get("h")).unwrap_or(DEFAULT_H),
        title: text(body.get("title")).unwrap_or_default(),
        desc: text(body.get("desc")).unwrap_or_default(),
        author: text(body.get("author")).unwrap_or_default(),
        cat: text(body.get("cat")).unwrap_or_else(|| CATEGORIES[0].to_string()),
        tags: tags(body.get("tags")),
        created_at: timestamp(body.get("createdAt")).unwrap_or(0),
    })
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn dimension(value: Option<&Value>) -> Option<u32> {
    let n = number(value?)?;
    (n.is_finite() && n >= 1.0 && n <= u32::MAX as f64).then(|| n.round() as u32)
}

/// Epoch millis, or a `{seconds, nanoseconds}` server timestamp.
fn timestamp(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    if let Some(obj) = value.as_object() {
        let seconds = obj.get("seconds").and_then(number)?;
        let nanos = obj.get("nanoseconds").and_then(number).unwrap_or(0.0);
        return Some((seconds * 1000.0 + nanos / 1_000_000.0) as i64);
    }
    number(value).filter(|n| n.is_finite()).map(|n| n as i64)
}

fn tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(raw)) => crate::models::parse_tags(raw),
        _ => Vec::new(),
    }
}
