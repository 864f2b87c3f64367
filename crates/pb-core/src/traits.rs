//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Every port is optional at runtime: without a remote feed, metadata
//! generator or identity provider the session runs in demo mode.

use std::fmt;

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use serde_json::Value;

use crate::models::{Credentials, ImagePayload, NewPin, PinMetadata, StoredImage, User};

/// String-keyed blob storage that survives restarts (the local-storage analog).
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// A document as delivered by the remote collection, not yet trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Full replacement payload, newest first.
    Snapshot(Vec<RemoteDocument>),
    /// The subscription reported a failure.
    Error(String),
}

pub type FeedCallback = Box<dyn Fn(FeedEvent) + Send + Sync>;

/// Cancellation handle for a live subscription.
///
/// `unsubscribe` consumes the handle, so it can run at most once. Dropping a
/// handle that was never unsubscribed cancels it as well.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// A handle with nothing to tear down.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Realtime pin collection, ordered by creation descending and capped at 50.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RemoteFeed: Send + Sync {
    /// Starts delivering snapshots to `on_event` until the handle is cancelled.
    fn subscribe(&self, on_event: FeedCallback) -> Subscription;

    /// Writes a new document and returns the id the store generated.
    async fn create(&self, pin: NewPin) -> anyhow::Result<String>;
}

/// Suggests pin metadata for an image.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MetadataGenerator: Send + Sync {
    async fn generate(&self, image: ImagePayload) -> anyhow::Result<PinMetadata>;
}

/// Sign-in contract. Protocol details stay inside the provider.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: Credentials) -> anyhow::Result<User>;

    /// Fire-and-forget; failures are only logged.
    async fn sign_out(&self);
}

/// Media storage contract for turning uploads into displayable references.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns the blob reference plus intrinsic size.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<StoredImage>;

    /// Returns the URL for a previously stored media id.
    fn url_for(&self, media_id: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscription_cancels_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_an_active_subscription_cancels_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        {
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
