//! Pipeline stages for outline-to-presentation generation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the network-facing ones can be swapped for fakes.
//!
//! ## Data Flow
//!
//! ```text
//! llm ──▶ postprocess ──▶ markup ──▶ mindmap ──────────▶ render
//! (outline) (cleanup)     (parse)    (llm+image+encode)  (pptx)
//! ```
//!
//! 1. [`llm`]         — completion-service seam and outline generation with
//!    retry/backoff
//! 2. [`postprocess`] — deterministic cleanup of model quirks (fences,
//!    decorated tags, odd bullets)
//! 3. [`markup`]      — tag markup → [`markup::SlideRecord`]s; never fails
//! 4. [`mindmap`]     — eager resolution of every `[MINDMAP]` occurrence via
//!    [`llm`], [`image`] and [`encode`]
//! 5. [`render`]      — records + bindings → [`crate::pptx::Deck`]

pub mod encode;
pub mod image;
pub mod llm;
pub mod markup;
pub mod mindmap;
pub mod postprocess;
pub mod render;
