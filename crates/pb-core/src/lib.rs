//! pinboard/crates/pb-core/src/lib.rs
//!
//! The pin state & filter synchronization core of PinBoard, and the port
//! traits every plugin implements.

pub mod autofill;
pub mod decode;
pub mod demo;
pub mod error;
pub mod filter;
pub mod interactions;
pub mod models;
pub mod notice;
pub mod repository;
pub mod scroll;
pub mod session;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

pub use autofill::{AutofillOutcome, UploadForm};
pub use demo::{DemoGenerator, CATEGORIES, TRENDING};
pub use interactions::{Interactions, MemoryStore};
pub use notice::{Language, Notice};
pub use repository::FeedMode;
pub use scroll::ViewportSample;
pub use session::{Session, SessionHandle};
