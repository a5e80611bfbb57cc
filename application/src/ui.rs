//! Process-wide UI-visibility flag.
//!
//! Modeled as explicit injectable state rather than a global, so independent
//! pipelines (and tests) can carry their own flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared visibility flag for the injected solve control and answer
/// annotations. Cloning shares the underlying flag.
#[derive(Debug, Clone)]
pub struct UiState {
    visible: Arc<AtomicBool>,
}

impl UiState {
    pub fn new(visible: bool) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(visible)),
        }
    }

    pub fn visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }
}

impl Default for UiState {
    /// Annotations are visible unless the user hid them.
    fn default() -> Self {
        Self::new(true)
    }
}
