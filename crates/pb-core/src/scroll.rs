//! # Infinite Scroll Controller
//!
//! Watches a sentinel near the end of the rendered grid and asks for the next
//! batch when it comes within `LOOKAHEAD_PX` of the viewport.

use serde::{Deserialize, Serialize};

/// How far below the viewport the sentinel counts as visible.
pub const LOOKAHEAD_PX: f64 = 600.0;

/// One viewport measurement reported by the client, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSample {
    pub scroll_top: f64,
    pub viewport_height: f64,
    /// Document offset of the sentinel's top edge
    pub sentinel_top: f64,
}

impl ViewportSample {
    fn sentinel_in_range(&self, margin: f64) -> bool {
        self.sentinel_top <= self.scroll_top + self.viewport_height + margin
    }
}

#[derive(Debug)]
pub struct ScrollController {
    margin: f64,
    intersecting: bool,
    connected: bool,
    inert: bool,
    loaded_batches: usize,
}

impl ScrollController {
    pub fn new() -> Self {
        Self::with_margin(LOOKAHEAD_PX)
    }

    pub fn with_margin(margin: f64) -> Self {
        Self { margin, intersecting: false, connected: true, inert: false, loaded_batches: 0 }
    }

    /// A controller that never fires (remote feeds push their own growth).
    pub fn inert() -> Self {
        Self { inert: true, ..Self::new() }
    }

    /// Returns the batch index to load when the sentinel enters range.
    /// Fires once per crossing; the sentinel has to leave range to re-arm.
    pub fn observe(&mut self, sample: ViewportSample) -> Option<usize> {
        if !self.connected || self.inert {
            return None;
        }
        let now_intersecting = sample.sentinel_in_range(self.margin);
        let crossed = now_intersecting && !self.intersecting;
        self.intersecting = now_intersecting;
        if !crossed {
            return None;
        }
        self.loaded_batches += 1;
        Some(self.loaded_batches)
    }

    /// Stops observing; later samples are ignored.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.intersecting = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn loaded_batches(&self) -> usize {
        self.loaded_batches
    }
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new()
    }
}
