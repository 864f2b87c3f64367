//! # Interaction Store
//!
//! Likes, saves, comments and the session user, persisted as four independent
//! JSON blobs (`likes`, `saved`, `comments`, `user`) in a `KeyValueStore`.
//!
//! Like policy: a like is a single boolean toggle between "absent" and
//! `{count: 1}`. Entries loaded with `count > 0` count as liked, a zero count
//! as not liked.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Comment, LikeEntry, User};
use crate::traits::KeyValueStore;

pub const LIKES_KEY: &str = "likes";
pub const SAVED_KEY: &str = "saved";
pub const COMMENTS_KEY: &str = "comments";
pub const USER_KEY: &str = "user";

/// The interaction maps, readable by the view engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interactions {
    pub likes: BTreeMap<String, LikeEntry>,
    pub saved: BTreeMap<String, bool>,
    pub comments: BTreeMap<String, Vec<Comment>>,
}

impl Interactions {
    pub fn is_liked(&self, pin_id: &str) -> bool {
        self.like_count(pin_id) > 0
    }

    pub fn like_count(&self, pin_id: &str) -> u32 {
        self.likes.get(pin_id).map_or(0, |entry| entry.count)
    }

    pub fn is_saved(&self, pin_id: &str) -> bool {
        self.saved.get(pin_id).copied().unwrap_or(false)
    }

    pub fn comments(&self, pin_id: &str) -> &[Comment] {
        self.comments.get(pin_id).map_or(&[], Vec::as_slice)
    }
}

/// Persistent owner of `Interactions` and the session user.
pub struct InteractionStore {
    backend: Box<dyn KeyValueStore>,
    state: Interactions,
    user: Option<User>,
}

impl InteractionStore {
    /// Loads all four blobs; anything missing or corrupt starts empty.
    pub fn load(backend: Box<dyn KeyValueStore>) -> Self {
        let state = Interactions {
            likes: read_blob(backend.as_ref(), LIKES_KEY).unwrap_or_default(),
            saved: read_blob(backend.as_ref(), SAVED_KEY).unwrap_or_default(),
            comments: read_blob(backend.as_ref(), COMMENTS_KEY).unwrap_or_default(),
        };
        let user = read_blob::<Option<User>>(backend.as_ref(), USER_KEY).flatten();
        tracing::debug!(
            likes = state.likes.len(),
            saved = state.saved.len(),
            commented = state.comments.len(),
            signed_in = user.is_some(),
            "interaction store loaded"
        );
        Self { backend, state, user }
    }

    pub fn state(&self) -> &Interactions {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Flips the like state and returns whether the pin is now liked.
    pub fn toggle_like(&mut self, pin_id: &str) -> bool {
        let liked = if self.state.is_liked(pin_id) {
            self.state.likes.remove(pin_id);
            false
        } else {
            self.state.likes.insert(pin_id.to_string(), LikeEntry { count: 1 });
            true
        };
        write_blob(self.backend.as_ref(), LIKES_KEY, &self.state.likes);
        liked
    }

    /// Flips the saved flag and returns the resulting state.
    pub fn toggle_save(&mut self, pin_id: &str) -> bool {
        let saved = !self.state.is_saved(pin_id);
        self.state.saved.insert(pin_id.to_string(), saved);
        write_blob(self.backend.as_ref(), SAVED_KEY, &self.state.saved);
        saved
    }

    /// Appends a trimmed comment. Blank text is a no-op and returns `false`.
    pub fn add_comment(&mut self, pin_id: &str, text: &str, at: i64) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.state
            .comments
            .entry(pin_id.to_string())
            .or_default()
            .push(Comment { text: text.to_string(), at });
        write_blob(self.backend.as_ref(), COMMENTS_KEY, &self.state.comments);
        true
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
        write_blob(self.backend.as_ref(), USER_KEY, &self.user);
    }
}

fn read_blob<T: DeserializeOwned>(backend: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted blob, starting empty");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupt persisted blob, starting empty");
            None
        }
    }
}

/// Last write wins. Failures are logged and swallowed.
fn write_blob<T: Serialize>(backend: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(anyhow::Error::from)
        .and_then(|json| backend.set(key, &json));
    if let Err(e) = result {
        tracing::warn!(key, error = %e, "failed to persist blob");
    }
}

/// Process-local `KeyValueStore`, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, key: &str, value: &str) -> Self {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.blobs.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }
}
