//! Shared fixtures for the cross-crate scenario tests.

use pb_core::{DemoGenerator, MemoryStore, RemoteDocument, SessionHandle};
use serde_json::json;

pub const BOUNDARY: &str = "pinboard-test-boundary";

/// Demo-mode session over an in-memory blob store.
pub fn demo_handle(seed: u64) -> SessionHandle {
    SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(seed), None)
}

/// A well-formed remote document.
pub fn doc(id: &str, title: &str, created_at: i64) -> RemoteDocument {
    RemoteDocument {
        id: id.to_string(),
        data: json!({
            "src": format!("https://img.example/{id}.jpg"),
            "w": 600,
            "h": 900,
            "title": title,
            "desc": "",
            "author": "Remote",
            "cat": "Arte",
            "tags": ["remote"],
            "createdAt": created_at,
        }),
    }
}

/// Builds a `multipart/form-data` body: text fields plus an optional file
/// given as (field name, file name, content type, bytes).
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((name, filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
