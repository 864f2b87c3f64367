//! # Pin Repository
//!
//! Holds the canonical, ordered pin sequence and reconciles it with exactly
//! one upstream per session: the demo generator or the remote feed.

use std::collections::HashSet;

use crate::decode::pin_from_document;
use crate::demo::{new_pin_id, DemoGenerator, CATEGORIES};
use crate::error::{AppError, Result};
use crate::models::{parse_tags, NewPin, Pin, PinDraft};
use crate::traits::RemoteDocument;

pub const INITIAL_BATCH: usize = 24;
pub const MORE_BATCH: usize = 12;
/// Offset multiplier between scroll batches, keeps numbering and image seeds apart.
pub const BATCH_STRIDE: usize = 100;
/// The remote collection never delivers more than this.
pub const REMOTE_LIMIT: usize = 50;

pub const DEFAULT_TITLE: &str = "Nuevo Pin";
const DEFAULT_W: u32 = 600;
const DEFAULT_H: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Demo,
    Remote,
}

pub struct PinRepository {
    pins: Vec<Pin>,
    mode: FeedMode,
    generator: DemoGenerator,
    showing_fallback: bool,
}

impl PinRepository {
    /// Demo mode, pre-populated with the initial batch.
    pub fn demo(mut generator: DemoGenerator, now_ms: i64) -> Self {
        let pins = generator.batch(INITIAL_BATCH, 0, now_ms);
        Self { pins, mode: FeedMode::Demo, generator, showing_fallback: false }
    }

    /// Remote mode, empty until the first snapshot arrives.
    pub fn remote(generator: DemoGenerator) -> Self {
        Self { pins: Vec::new(), mode: FeedMode::Remote, generator, showing_fallback: false }
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn get(&self, id: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// True while a local demo batch stands in for an empty remote collection.
    pub fn is_showing_fallback(&self) -> bool {
        self.showing_fallback
    }

    /// Replaces the whole sequence with the snapshot, keeping feed order.
    /// An empty (or entirely undecodable) snapshot is replaced by a local
    /// demo batch that never leaves this repository.
    pub fn apply_snapshot(&mut self, docs: &[RemoteDocument], now_ms: i64) -> usize {
        let mut seen = HashSet::new();
        let pins: Vec<Pin> = docs
            .iter()
            .filter_map(|doc| {
                let pin = pin_from_document(doc);
                if pin.is_none() {
                    tracing::warn!(doc_id = %doc.id, "dropping undecodable remote document");
                }
                pin
            })
            .filter(|pin| seen.insert(pin.id.clone()))
            .take(REMOTE_LIMIT)
            .collect();

        if pins.is_empty() {
            tracing::info!("remote snapshot is empty, showing demo batch");
            self.fill_with_fallback(now_ms);
        } else {
            tracing::debug!(count = pins.len(), "applied remote snapshot");
            self.pins = pins;
            self.showing_fallback = false;
        }
        self.pins.len()
    }

    /// Keeps the last good snapshot; only an empty view falls back to demo data.
    pub fn apply_feed_error(&mut self, message: &str, now_ms: i64) -> AppError {
        tracing::warn!(error = message, "remote feed reported a failure");
        if self.pins.is_empty() {
            self.fill_with_fallback(now_ms);
        }
        AppError::RemoteRead(message.to_string())
    }

    fn fill_with_fallback(&mut self, now_ms: i64) {
        self.pins = self.generator.batch(INITIAL_BATCH, 0, now_ms);
        self.showing_fallback = true;
    }

    /// Validates a draft and builds the document to publish.
    pub fn prepare(&self, draft: PinDraft, author: &str, now_ms: i64) -> Result<NewPin> {
        let title = draft.title.trim().to_string();
        let url = draft
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        let (src, w, h) = match (draft.image, url) {
            (Some(image), _) => (image.url, image.w, image.h),
            (None, Some(url)) => {
                if !is_displayable(&url) {
                    return Err(AppError::validation(format!("unsupported image source '{url}'")));
                }
                (url, DEFAULT_W, DEFAULT_H)
            }
            (None, None) if title.is_empty() => {
                return Err(AppError::validation("a title or an image is required"));
            }
            (None, None) => match self.mode {
                FeedMode::Demo => return Err(AppError::validation("an image URL or file is required")),
                FeedMode::Remote => (placeholder_src(now_ms), DEFAULT_W, DEFAULT_H),
            },
        };

        let cat = match draft.cat.trim() {
            "" => CATEGORIES[0].to_string(),
            cat => cat.to_string(),
        };

        Ok(NewPin {
            src,
            w,
            h,
            title: if title.is_empty() { DEFAULT_TITLE.to_string() } else { title },
            desc: draft.desc.trim().to_string(),
            author: author.to_string(),
            cat,
            tags: parse_tags(&draft.tags),
            created_at: now_ms,
        })
    }

    /// Demo-mode publish: assigns an id and prepends. Nothing changes on error.
    pub fn create(&mut self, draft: PinDraft, author: &str, now_ms: i64) -> Result<Pin> {
        if self.mode == FeedMode::Remote {
            return Err(AppError::Internal("remote sessions publish through the feed".into()));
        }
        let pin = self.prepare(draft, author, now_ms)?.with_id(self.unused_id());
        self.pins.insert(0, pin.clone());
        tracing::info!(pin_id = %pin.id, "published pin locally");
        Ok(pin)
    }

    /// Appends the next synthetic batch (demo mode only) and returns it.
    pub fn load_more(&mut self, batch_index: usize, now_ms: i64) -> &[Pin] {
        let start = self.pins.len();
        if self.mode == FeedMode::Remote {
            tracing::debug!(batch_index, "ignoring load_more while the remote feed is active");
            return &self.pins[start..];
        }

        let existing: HashSet<String> = self.pins.iter().map(|p| p.id.clone()).collect();
        let batch = self.generator.batch(MORE_BATCH, batch_index * BATCH_STRIDE, now_ms);
        self.pins.extend(batch.into_iter().filter(|p| !existing.contains(&p.id)));
        tracing::debug!(batch_index, added = self.pins.len() - start, "loaded more demo pins");
        &self.pins[start..]
    }

    fn unused_id(&self) -> String {
        loop {
            let id = new_pin_id();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn is_displayable(src: &str) -> bool {
    ["https://", "http://", "/", "data:image/", "blob:"]
        .iter()
        .any(|prefix| src.starts_with(prefix))
}

fn placeholder_src(now_ms: i64) -> String {
    format!("https://picsum.photos/seed/{now_ms}/{DEFAULT_W}/{DEFAULT_H}")
}
