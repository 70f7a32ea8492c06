//! Build entry points: topic → outline → deck, or edited outline → deck.
//!
//! Both paths converge on the same steps once the outline text exists:
//!
//! ```text
//! outline ─▶ parse ─▶ resolve mind-maps ─▶ render ─▶ package
//! ```
//!
//! Only outline generation can fail the build. Mind-map failures are
//! recorded on their bindings and rendered as placeholders.

use crate::config::GenerationConfig;
use crate::error::{PptGenError, ServiceError};
use crate::output::{BuildOutput, BuildStats, MindmapBinding, RenderedDocument};
use crate::pipeline::image::{HttpImageService, ImageService};
use crate::pipeline::llm::{
    self, CompletionService, HttpCompletion, PromptMessage, ProviderCompletion,
    DEFAULT_CHAT_MODEL,
};
use crate::pipeline::markup::{parse_outline, SlideRecord};
use crate::pipeline::{mindmap, render};
use crate::store::DocumentStore;
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Drives one build at a time against injected services.
///
/// Holds no per-build state; the same generator can serve any number of
/// builds, concurrently or not.
pub struct Generator {
    config: GenerationConfig,
    completion: Arc<dyn CompletionService>,
    images: Arc<dyn ImageService>,
    /// Set when no chat backend could be resolved: `(provider, hint)`.
    unconfigured: Option<(String, String)>,
}

/// Chat backend stand-in used when no provider is configured.
///
/// Every call fails, so mind-maps render as placeholders while outlines
/// without mind-maps still rebuild offline.
struct UnconfiguredCompletion {
    provider: String,
    hint: String,
}

#[async_trait]
impl CompletionService for UnconfiguredCompletion {
    async fn complete(&self, _messages: &[PromptMessage]) -> Result<String, ServiceError> {
        Err(ServiceError::Provider(format!(
            "no LLM provider configured ({}): {}",
            self.provider, self.hint
        )))
    }
}

impl Generator {
    /// A generator over caller-supplied services.
    pub fn new(
        config: GenerationConfig,
        completion: Arc<dyn CompletionService>,
        images: Arc<dyn ImageService>,
    ) -> Self {
        Self {
            config,
            completion,
            images,
            unconfigured: None,
        }
    }

    /// A generator over the services `config` describes.
    ///
    /// See [`resolve_completion`] for how the chat backend is chosen. The
    /// image service always speaks the OpenAI images protocol at
    /// `config.image_endpoint`.
    ///
    /// A missing provider is not an error here: rebuilding an edited outline
    /// needs no chat call unless it declares mind-maps. Topic builds report
    /// [`PptGenError::ProviderNotConfigured`] instead.
    pub fn from_config(config: GenerationConfig) -> Result<Self, PptGenError> {
        let mut config = config;
        if config.api_key.is_none() {
            config.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
        let images: Arc<dyn ImageService> = Arc::new(HttpImageService::new(&config)?);
        let completion = resolve_completion(&config);
        Self::with_resolved(config, completion, images)
    }

    fn with_resolved(
        config: GenerationConfig,
        completion: Result<Arc<dyn CompletionService>, PptGenError>,
        images: Arc<dyn ImageService>,
    ) -> Result<Self, PptGenError> {
        match completion {
            Ok(completion) => Ok(Self::new(config, completion, images)),
            Err(PptGenError::ProviderNotConfigured { provider, hint }) => {
                warn!(
                    "No LLM provider configured ({}); mind-maps will render as placeholders",
                    provider
                );
                let stand_in = Arc::new(UnconfiguredCompletion {
                    provider: provider.clone(),
                    hint: hint.clone(),
                });
                let mut generator = Self::new(config, stand_in, images);
                generator.unconfigured = Some((provider, hint));
                Ok(generator)
            }
            Err(e) => Err(e),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Ask the completion service for a cleaned outline on `topic`.
    pub async fn generate_outline(
        &self,
        topic: &str,
        reference: Option<&str>,
    ) -> Result<String, PptGenError> {
        if let Some((ref provider, ref hint)) = self.unconfigured {
            return Err(PptGenError::ProviderNotConfigured {
                provider: provider.clone(),
                hint: hint.clone(),
            });
        }
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_outline_start(topic);
        }
        let outline =
            llm::generate_outline(self.completion.as_ref(), topic, reference, &self.config).await?;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_outline_complete(outline.len());
        }
        Ok(outline)
    }

    /// Generate an outline for `topic`, then build the deck from it.
    ///
    /// # Errors
    /// [`PptGenError::LlmApiError`] when the outline request fails after all
    /// retries; [`PptGenError::Packaging`] if the package cannot be written.
    pub async fn build_from_topic(
        &self,
        topic: &str,
        reference: Option<&str>,
    ) -> Result<BuildOutput, PptGenError> {
        let started = Instant::now();
        info!("Building deck for topic: {}", topic);
        let outline = self.generate_outline(topic, reference).await?;
        self.build(outline, started).await
    }

    /// Build the deck from caller-edited outline text, parsed as given.
    pub async fn rebuild_from_outline(&self, outline: &str) -> Result<BuildOutput, PptGenError> {
        info!("Rebuilding deck from {} byte outline", outline.len());
        self.build(outline.to_string(), Instant::now()).await
    }

    /// [`Self::build_from_topic`], then save into `store`.
    pub async fn build_to_store(
        &self,
        topic: &str,
        reference: Option<&str>,
        store: &DocumentStore,
    ) -> Result<(BuildOutput, PathBuf), PptGenError> {
        let output = self.build_from_topic(topic, reference).await?;
        let path = store.save(&output.document.bytes)?.to_path_buf();
        Ok((output, path))
    }

    /// [`Self::rebuild_from_outline`], then save into `store`.
    pub async fn rebuild_to_store(
        &self,
        outline: &str,
        store: &DocumentStore,
    ) -> Result<(BuildOutput, PathBuf), PptGenError> {
        let output = self.rebuild_from_outline(outline).await?;
        let path = store.save(&output.document.bytes)?.to_path_buf();
        Ok((output, path))
    }

    async fn build(&self, outline: String, started: Instant) -> Result<BuildOutput, PptGenError> {
        let records = parse_outline(&outline);
        let mindmaps: usize = records.iter().map(|r| r.mindmaps.len()).sum();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_build_start(records.len(), mindmaps);
        }

        let bindings = mindmap::resolve_all(
            &records,
            self.completion.as_ref(),
            self.images.as_ref(),
            &self.config,
        )
        .await;

        let output = assemble(outline, records, bindings, &self.config, started)?;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_build_complete(output.stats.rendered_slides, output.stats.mindmaps_resolved);
        }
        Ok(output)
    }
}

/// Render and package already-resolved inputs.
///
/// Pure apart from packaging: no service is called. Bindings missing for a
/// declared mind-map render as failure placeholders.
pub fn assemble(
    outline: String,
    records: Vec<SlideRecord>,
    bindings: Vec<MindmapBinding>,
    config: &GenerationConfig,
    started: Instant,
) -> Result<BuildOutput, PptGenError> {
    let deck = render::render_deck(&records, &bindings, config);
    let bytes = deck.to_bytes()?;

    let resolved = bindings.iter().filter(|b| b.is_resolved()).count();
    let stats = BuildStats {
        parsed_slides: records.len(),
        rendered_slides: deck.slide_count(),
        mindmaps_total: bindings.len(),
        mindmaps_resolved: resolved,
        mindmaps_failed: bindings.len() - resolved,
        total_duration_ms: started.elapsed().as_millis() as u64,
    };
    if stats.mindmaps_failed > 0 {
        warn!(
            "{}/{} mind-map(s) failed and were rendered as placeholders",
            stats.mindmaps_failed, stats.mindmaps_total
        );
    }
    info!(
        "Build complete: {} record(s) → {} slide(s), {} bytes, {}ms",
        stats.parsed_slides,
        stats.rendered_slides,
        bytes.len(),
        stats.total_duration_ms
    );

    Ok(BuildOutput {
        outline,
        slides: records,
        bindings,
        document: RenderedDocument {
            slide_count: deck.slide_count(),
            bytes,
        },
        stats,
    })
}

/// Generate and build with services resolved from `config`.
pub async fn generate(
    topic: &str,
    reference: Option<&str>,
    config: &GenerationConfig,
) -> Result<BuildOutput, PptGenError> {
    Generator::from_config(config.clone())?
        .build_from_topic(topic, reference)
        .await
}

/// Rebuild from edited outline text with services resolved from `config`.
pub async fn rebuild(outline: &str, config: &GenerationConfig) -> Result<BuildOutput, PptGenError> {
    Generator::from_config(config.clone())?
        .rebuild_from_outline(outline)
        .await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    topic: &str,
    reference: Option<&str>,
    config: &GenerationConfig,
) -> Result<BuildOutput, PptGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PptGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(topic, reference, config))
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PptGenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PptGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Choose the chat backend, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Raw endpoint** (`config.chat_endpoint`): plain OpenAI-compatible
///    POST with `config.api_key` as bearer token.
/// 3. **Named provider + model** (`config.provider_name`).
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 5. **`OPENAI_API_KEY`** present → OpenAI.
/// 6. **Auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_completion(
    config: &GenerationConfig,
) -> Result<Arc<dyn CompletionService>, PptGenError> {
    let provider = if let Some(ref provider) = config.provider {
        Arc::clone(provider)
    } else if let Some(ref endpoint) = config.chat_endpoint {
        info!("Using chat endpoint {}", endpoint);
        return Ok(Arc::new(HttpCompletion::new(endpoint.clone(), config)?));
    } else if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL);
        create_provider(name, model)?
    } else {
        resolve_env_provider(config)?
    };
    Ok(Arc::new(ProviderCompletion::new(provider, config)))
}

fn resolve_env_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, PptGenError> {
    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL);
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PptGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY (optionally API_REQUEST_URL), or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
