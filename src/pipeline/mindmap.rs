//! Mind-map resolution: `[MINDMAP]` occurrence → embeddable image.
//!
//! Each occurrence goes through four steps, any of which may fail:
//!
//! ```text
//! title + reference
//!   │
//!   ├─ 1. completion service  → text containing @startmindmap … @endmindmap
//!   ├─ 2. extract block       → sentinels included
//!   ├─ 3. image service       → one image (URL or inline bytes)
//!   └─ 4. fetch + prepare     → PNG/JPEG bytes with pixel size
//! ```
//!
//! A failure never aborts the build: the binding carries a [`MindmapError`]
//! and the renderer draws a failure placeholder. No step is retried.
//!
//! All occurrences are resolved eagerly, before rendering, with up to
//! `config.concurrency` in flight. `buffered` keeps the output in outline
//! order regardless of completion order.

use crate::config::GenerationConfig;
use crate::error::MindmapError;
use crate::output::MindmapBinding;
use crate::pipeline::encode::{prepare_image, EmbeddedImage};
use crate::pipeline::image::{GeneratedImage, ImageService};
use crate::pipeline::llm::{CompletionService, PromptMessage};
use crate::pipeline::markup::SlideRecord;
use crate::prompts::{mindmap_instruction, MINDMAP_SYSTEM_PROMPT};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

pub const MINDMAP_START: &str = "@startmindmap";
pub const MINDMAP_END: &str = "@endmindmap";

/// A successfully resolved mind-map.
#[derive(Debug, Clone)]
pub struct ResolvedMindmap {
    /// Where the image service hosted the picture, if it returned a URL.
    pub url: Option<String>,
    pub image: EmbeddedImage,
}

/// Return the `@startmindmap … @endmindmap` block, sentinels included.
///
/// The end sentinel must follow the start sentinel; otherwise `None`.
pub fn extract_mindmap_block(text: &str) -> Option<&str> {
    let start = text.find(MINDMAP_START)?;
    let end_rel = text[start + MINDMAP_START.len()..].find(MINDMAP_END)?;
    let end = start + MINDMAP_START.len() + end_rel + MINDMAP_END.len();
    Some(&text[start..end])
}

/// List every mind-map occurrence in outline order, unresolved.
pub fn pending_bindings(records: &[SlideRecord]) -> Vec<MindmapBinding> {
    records
        .iter()
        .flat_map(|record| {
            record
                .mindmaps
                .iter()
                .enumerate()
                .map(move |(position, m)| {
                    MindmapBinding::pending(record.index, position, &m.title, &m.reference)
                })
        })
        .collect()
}

/// Run the four resolution steps for one mind-map.
pub async fn resolve_mindmap(
    completion: &dyn CompletionService,
    images: &dyn ImageService,
    title: &str,
    reference: &str,
) -> Result<ResolvedMindmap, MindmapError> {
    let messages = [
        PromptMessage::system(MINDMAP_SYSTEM_PROMPT),
        PromptMessage::user(mindmap_instruction(title, reference)),
    ];

    let text = completion
        .complete(&messages)
        .await
        .map_err(|e| MindmapError::CompletionFailed {
            title: title.to_string(),
            detail: e.to_string(),
        })?;

    let block = extract_mindmap_block(&text).ok_or_else(|| MindmapError::MissingSentinel {
        title: title.to_string(),
    })?;
    debug!("Mind-map '{}': {} byte block", title, block.len());

    let generated = images
        .generate(block)
        .await
        .map_err(|e| MindmapError::ImageGenerationFailed {
            title: title.to_string(),
            detail: e.to_string(),
        })?;

    let (url, bytes) = match generated {
        GeneratedImage::Url(url) => {
            let bytes = images
                .fetch(&url)
                .await
                .map_err(|e| MindmapError::ImageFetchFailed {
                    title: title.to_string(),
                    url: url.clone(),
                    detail: e.to_string(),
                })?;
            (Some(url), bytes)
        }
        GeneratedImage::Inline(bytes) => (None, bytes),
    };

    let image = prepare_image(&bytes).map_err(|e| MindmapError::ImageDecodeFailed {
        title: title.to_string(),
        url: url.clone(),
        detail: e.to_string(),
    })?;

    Ok(ResolvedMindmap { url, image })
}

/// Resolve every mind-map declared in `records`.
///
/// Returns one binding per occurrence, in outline order. Failures are
/// recorded on the binding, never returned.
pub async fn resolve_all(
    records: &[SlideRecord],
    completion: &dyn CompletionService,
    images: &dyn ImageService,
    config: &GenerationConfig,
) -> Vec<MindmapBinding> {
    let pending = pending_bindings(records);
    let total = pending.len();
    if total == 0 {
        return pending;
    }
    info!(
        "Resolving {} mind-map(s), concurrency {}",
        total, config.concurrency
    );

    let progress = config.progress_callback.clone();

    stream::iter(pending.into_iter().enumerate().map(|(ordinal, mut binding)| {
        let progress = progress.clone();
        async move {
            if let Some(ref cb) = progress {
                cb.on_mindmap_start(ordinal, total, &binding.title);
            }

            match resolve_mindmap(completion, images, &binding.title, &binding.reference).await {
                Ok(resolved) => {
                    info!(
                        "Mind-map {}/{} '{}' resolved ({}×{})",
                        ordinal + 1,
                        total,
                        binding.title,
                        resolved.image.width_px,
                        resolved.image.height_px
                    );
                    binding.url = resolved.url;
                    binding.image = Some(resolved.image);
                    if let Some(ref cb) = progress {
                        cb.on_mindmap_complete(ordinal, total, &binding.title);
                    }
                }
                Err(e) => {
                    warn!("Mind-map {}/{} failed: {}", ordinal + 1, total, e);
                    if let Some(ref cb) = progress {
                        cb.on_mindmap_error(ordinal, total, &binding.title, &e.to_string());
                    }
                    binding.url = e.generated_url().map(str::to_string);
                    binding.error = Some(e);
                }
            }
            binding
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await
}
