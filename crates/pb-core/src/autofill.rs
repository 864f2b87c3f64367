//! Upload form state and stale-response protection for AI metadata requests.
//!
//! Every request gets a fresh id. Only the response matching the latest id
//! may touch the form; closing or resetting the form invalidates it.

use crate::error::AppError;
use crate::models::PinMetadata;

/// Editable fields of the open upload form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub title: String,
    pub desc: String,
    pub cat: String,
    pub tags: String,
    /// Image URL as typed, kept so a rejected draft can be corrected
    pub url: String,
    /// Set while a remote publish is in flight
    pub uploading: bool,
}

impl UploadForm {
    /// Overwrites the four metadata fields, keeping the URL. Category is taken as returned.
    pub fn apply(&mut self, meta: &PinMetadata) {
        self.title = meta.title.trim().to_string();
        self.desc = meta.description.trim().to_string();
        self.cat = meta.category.trim().to_string();
        self.tags = meta.tags.join(", ");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub enum AutofillOutcome {
    Applied(PinMetadata),
    /// Superseded or the form was closed; the response was dropped.
    Stale,
    Failed(AppError),
}

#[derive(Debug, Default)]
pub struct AutofillController {
    last_issued: u64,
    pending: Option<RequestId>,
}

impl AutofillController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RequestId {
        self.last_issued += 1;
        let id = RequestId(self.last_issued);
        self.pending = Some(id);
        id
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Forgets the in-flight request, if any.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn complete(&mut self, id: RequestId, result: Result<PinMetadata, AppError>) -> AutofillOutcome {
        if self.pending != Some(id) {
            tracing::debug!(request = id.value(), "discarding stale autofill response");
            return AutofillOutcome::Stale;
        }
        self.pending = None;
        match result {
            Ok(meta) => AutofillOutcome::Applied(meta),
            Err(e) => AutofillOutcome::Failed(e),
        }
    }
}
