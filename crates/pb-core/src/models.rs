//! # Domain Models
//!
//! These structs represent the core entities of PinBoard.
//! Field names serialize in camelCase so persisted blobs and remote documents
//! keep the shape the web client expects (`createdAt`, `displayName`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single shareable image post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    /// Opaque id, unique within the in-memory collection
    pub id: String,
    /// Image URI (remote URL or a `/media/...` blob reference)
    pub src: String,
    /// Intrinsic size, only used for the layout aspect ratio
    pub w: u32,
    pub h: u32,
    pub title: String,
    pub desc: String,
    pub author: String,
    /// One of `CATEGORIES`, not enforced on write
    pub cat: String,
    pub tags: Vec<String>,
    /// Epoch milliseconds
    pub created_at: i64,
}

/// A pin as written to the remote collection, which assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPin {
    pub src: String,
    pub w: u32,
    pub h: u32,
    pub title: String,
    pub desc: String,
    pub author: String,
    pub cat: String,
    pub tags: Vec<String>,
    pub created_at: i64,
}

impl NewPin {
    pub fn with_id(self, id: impl Into<String>) -> Pin {
        Pin {
            id: id.into(),
            src: self.src,
            w: self.w,
            h: self.h,
            title: self.title,
            desc: self.desc,
            author: self.author,
            cat: self.cat,
            tags: self.tags,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    /// Epoch milliseconds
    pub at: i64,
}

/// Value stored in the `likes` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEntry {
    pub count: u32,
}

/// The signed-in user. Absence means anonymous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl User {
    /// Short label for the header button: display name or the email local part.
    pub fn handle(&self) -> &str {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickFilter {
    Saved,
    Liked,
    Recent,
}

impl QuickFilter {
    pub const ALL: [QuickFilter; 3] = [QuickFilter::Saved, QuickFilter::Liked, QuickFilter::Recent];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuickFilter::Saved => "saved",
            QuickFilter::Liked => "liked",
            QuickFilter::Recent => "recent",
        }
    }
}

impl fmt::Display for QuickFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuickFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saved" => Ok(QuickFilter::Saved),
            "liked" => Ok(QuickFilter::Liked),
            "recent" => Ok(QuickFilter::Recent),
            other => Err(AppError::validation(format!("unknown quick filter '{other}'"))),
        }
    }
}

/// Active view criteria. Derived state, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub query: String,
    pub category: Option<String>,
    pub quick: Option<QuickFilter>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.category.is_none() && self.quick.is_none()
    }
}

/// An uploaded file after the media store turned it into a blob reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub media_id: String,
    pub url: String,
    pub w: u32,
    pub h: u32,
}

/// Raw upload form input.
#[derive(Debug, Clone, Default)]
pub struct PinDraft {
    pub title: String,
    pub desc: String,
    pub cat: String,
    /// Comma separated
    pub tags: String,
    pub url: Option<String>,
    pub image: Option<StoredImage>,
}

/// Splits a comma separated tag field, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Image handed to the generative metadata service.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Suggested metadata returned by the generative service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Should be one of `CATEGORIES`; near-matches are accepted as-is
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_serializes_created_at_camel_case() {
        let pin = NewPin {
            src: "https://img".into(),
            w: 1,
            h: 2,
            title: "t".into(),
            desc: String::new(),
            author: "a".into(),
            cat: "Arte".into(),
            tags: vec![],
            created_at: 42,
        }
        .with_id("p1");
        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["createdAt"], 42);
        assert_eq!(json["id"], "p1");
    }

    #[test]
    fn user_photo_url_uses_provider_casing() {
        let user: User = serde_json::from_str(
            r#"{"email":"a@b.c","displayName":"Ana","photoURL":"https://p"}"#,
        )
        .unwrap();
        assert_eq!(user.photo_url.as_deref(), Some("https://p"));
        assert_eq!(user.handle(), "Ana");

        let bare = User { email: "zoe@x.io".into(), display_name: None, photo_url: None, uid: None };
        assert_eq!(bare.handle(), "zoe");
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"email":"zoe@x.io"}"#);
    }

    #[test]
    fn tags_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(parse_tags(" art, design ,, minimal "), vec!["art", "design", "minimal"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn quick_filter_parses_known_names_only() {
        assert_eq!("recent".parse::<QuickFilter>().unwrap(), QuickFilter::Recent);
        assert!("popular".parse::<QuickFilter>().is_err());
    }
}
