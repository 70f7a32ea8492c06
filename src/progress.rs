//! Progress-callback trait for build events.
//!
//! Inject an [`Arc<dyn BuildProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the outline is generated and each mind-map is resolved.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pptgen::{BuildProgressCallback, GenerationConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     resolved: AtomicUsize,
//! }
//!
//! impl BuildProgressCallback for CountingCallback {
//!     fn on_mindmap_complete(&self, ordinal: usize, total: usize, title: &str) {
//!         self.resolved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("mind-map {}/{} '{}' ready", ordinal + 1, total, title);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { resolved: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(cb as Arc<dyn BuildProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the build pipeline as it progresses.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// mind-map events may arrive from several tasks at once. All methods have
/// default no-op implementations so callers only override what they need.
pub trait BuildProgressCallback: Send + Sync {
    /// Called before the outline request is sent.
    fn on_outline_start(&self, topic: &str) {
        let _ = topic;
    }

    /// Called once the outline text is available.
    ///
    /// # Arguments
    /// * `outline_len` — byte length of the outline
    fn on_outline_complete(&self, outline_len: usize) {
        let _ = outline_len;
    }

    /// Called after parsing, before any mind-map is resolved.
    ///
    /// # Arguments
    /// * `slides`   — parsed slide records
    /// * `mindmaps` — mind-map occurrences that will be resolved
    fn on_build_start(&self, slides: usize, mindmaps: usize) {
        let _ = (slides, mindmaps);
    }

    /// Called just before a mind-map is requested.
    ///
    /// # Arguments
    /// * `ordinal` — 0-based occurrence index in outline order
    /// * `total`   — mind-map occurrences in the outline
    fn on_mindmap_start(&self, ordinal: usize, total: usize, title: &str) {
        let _ = (ordinal, total, title);
    }

    /// Called when a mind-map image is ready.
    fn on_mindmap_complete(&self, ordinal: usize, total: usize, title: &str) {
        let _ = (ordinal, total, title);
    }

    /// Called when a mind-map could not be resolved.
    fn on_mindmap_error(&self, ordinal: usize, total: usize, title: &str, error: &str) {
        let _ = (ordinal, total, title, error);
    }

    /// Called once the deck has been rendered.
    ///
    /// # Arguments
    /// * `rendered_slides` — slides in the document, mind-map slides included
    /// * `resolved`        — mind-maps that produced an image
    fn on_build_complete(&self, rendered_slides: usize, resolved: usize) {
        let _ = (rendered_slides, resolved);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BuildProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn BuildProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        rendered: AtomicUsize,
    }

    impl BuildProgressCallback for TrackingCallback {
        fn on_mindmap_start(&self, _ordinal: usize, _total: usize, _title: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_mindmap_complete(&self, _ordinal: usize, _total: usize, _title: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_mindmap_error(&self, _ordinal: usize, _total: usize, _title: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_build_complete(&self, rendered_slides: usize, _resolved: usize) {
            self.rendered.store(rendered_slides, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_outline_start("rust");
        cb.on_outline_complete(120);
        cb.on_build_start(5, 1);
        cb.on_mindmap_start(0, 1, "x");
        cb.on_mindmap_error(0, 1, "x", "boom");
        cb.on_build_complete(6, 0);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_mindmap_start(0, 2, "a");
        tracker.on_mindmap_complete(0, 2, "a");
        tracker.on_mindmap_start(1, 2, "b");
        tracker.on_mindmap_error(1, 2, "b", "HTTP 500");
        tracker.on_build_complete(7, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.rendered.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn BuildProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_build_start(3, 0);
        cb.on_build_complete(3, 0);
    }
}
