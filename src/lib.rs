//! # edgequake-pptgen
//!
//! Turn a topic into a PowerPoint deck with a Large Language Model.
//!
//! The model writes a slide outline in a small line-tag markup; the crate
//! parses it, asks an image model for any requested mind-maps, and renders a
//! `.pptx` package. Edited outlines can be rebuilt without a new outline
//! request.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic (+ reference)
//!  │
//!  ├─ 1. Outline   chat completion with retry/backoff, then cleanup
//!  ├─ 2. Parse     [SLIDE]/[TITLE]/[SUBTITLE]/[CONTENT]/-/[IMAGE]/[MINDMAP] → SlideRecord
//!  ├─ 3. Mind-maps completion → @startmindmap block → image → fetch (bounded concurrency)
//!  ├─ 4. Render    cover + content slides, placeholder boxes, one slide per mind-map
//!  └─ 5. Package   OOXML zip, optionally saved to a DocumentStore
//! ```
//!
//! ## Outline Markup
//!
//! ```text
//! [SLIDE]
//! [TITLE]Ownership in Rust
//! [SUBTITLE]Moves, borrows and lifetimes
//! [SLIDE]
//! [TITLE]Borrowing
//! [CONTENT]
//! - Shared references are read-only
//! - One mutable reference at a time
//! [IMAGE]diagram of two references to one value
//! [MINDMAP]Borrow rules|shared vs mutable, scopes, NLL
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pptgen::{DocumentStore, GenerationConfig, Generator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / EDGEQUAKE_LLM_PROVIDER / …
//!     let generator = Generator::from_config(GenerationConfig::default())?;
//!     let (output, path) = generator
//!         .build_to_store("Ownership in Rust", None, &DocumentStore::default())
//!         .await?;
//!     println!("{} slides written to {}", output.stats.rendered_slides, path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pptgen` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pptgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod pptx;
pub mod progress;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::{MindmapError, PptGenError, ServiceError};
pub use generate::{assemble, generate, generate_sync, rebuild, resolve_completion, Generator};
pub use output::{BuildOutput, BuildStats, MindmapBinding, RenderedDocument};
pub use pipeline::image::{GeneratedImage, HttpImageService, ImageService};
pub use pipeline::llm::{CompletionService, HttpCompletion, PromptMessage, ProviderCompletion, Role};
pub use pipeline::markup::{parse_outline, to_markup, ImageDescriptor, MindmapDescriptor, SlideRecord};
pub use progress::{BuildProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{DocumentStore, DEFAULT_DOCUMENT_PATH};
