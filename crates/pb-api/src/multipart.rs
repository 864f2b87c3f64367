//! Collects a multipart upload form into text fields and at most one file.

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;
use pb_core::AppError;

/// Larger uploads are rejected before they reach the media store.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MAX_TEXT_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct FilePart {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct UploadFields {
    pub text: HashMap<String, String>,
    pub file: Option<FilePart>,
}

impl UploadFields {
    pub fn text(&self, name: &str) -> String {
        self.text.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
    }
}

pub async fn read_fields(mut payload: Multipart) -> Result<UploadFields, AppError> {
    let mut fields = UploadFields::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::validation(format!("malformed upload: {e}")))?;
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let declared = field.content_type().map(|m| m.essence_str().to_string());

        let limit = if filename.is_some() { MAX_UPLOAD_BYTES } else { MAX_TEXT_BYTES };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::validation(format!("upload interrupted: {e}")))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::validation(format!("field '{name}' is too large")));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            // An untouched file input still sends an empty part.
            Some(_) if bytes.is_empty() => {}
            Some(filename) => {
                let content_type = declared
                    .filter(|m| m != "application/octet-stream")
                    .unwrap_or_else(|| mime_guess::from_path(&filename).first_or_octet_stream().to_string());
                fields.file = Some(FilePart { bytes, content_type });
            }
            None => {
                let value = String::from_utf8(bytes)
                    .map_err(|_| AppError::validation(format!("field '{name}' is not valid UTF-8")))?;
                fields.text.insert(name, value);
            }
        }
    }

    Ok(fields)
}
