//! Configuration types for deck generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The config is read once when the
//! [`crate::Generator`] is constructed and never mutated afterwards, so one
//! config can be shared by every build in the process.

use crate::error::PptGenError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// EMUs (English Metric Units) per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Default OpenAI-compatible image-generation endpoint.
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";

/// Configuration for outline generation, mind-map resolution and rendering.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pptgen::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-mini")
///     .image_size("1024x1024")
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Chat model identifier, e.g. "gpt-4.1-mini". If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over everything else.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Raw OpenAI-compatible chat-completion URL. When set, outline and
    /// mind-map requests are posted here directly instead of going through
    /// an edgequake-llm provider.
    pub chat_endpoint: Option<String>,

    /// Bearer token for `chat_endpoint` and the image endpoint.
    pub api_key: Option<String>,

    /// Image model identifier. Default: "dall-e-3".
    pub image_model: String,

    /// Requested image resolution, `WIDTHxHEIGHT`. Default: "1024x1024".
    pub image_size: String,

    /// Image-generation endpoint. Default: OpenAI's `/v1/images/generations`.
    pub image_endpoint: String,

    /// Sampling temperature for the outline completion. Default: 0.7.
    ///
    /// Outlines benefit from some variety; mind-map markup uses the same value.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per request. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts for the outline request. Default: 2.
    ///
    /// Mind-map requests are never retried: a failed mind-map degrades to a
    /// placeholder slide, which is cheaper than stalling the whole build.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom outline system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Number of mind-maps resolved concurrently. Default: 1 (sequential).
    ///
    /// Results keep outline order regardless of this value.
    pub concurrency: usize,

    /// Per-request timeout for completion and image generation, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Timeout for downloading a generated image, in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Typeface applied to every text run. Default: "Microsoft YaHei".
    pub font_family: String,

    /// Slide width in EMUs. Default: 13.33 in (16:9).
    pub slide_width: i64,

    /// Slide height in EMUs. Default: 7.5 in.
    pub slide_height: i64,

    /// Receives per-mind-map progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            chat_endpoint: None,
            api_key: None,
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            system_prompt: None,
            concurrency: 1,
            api_timeout_secs: 120,
            download_timeout_secs: 60,
            font_family: "Microsoft YaHei".to_string(),
            slide_width: 12_188_952,
            slide_height: 6_858_000,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("chat_endpoint", &self.chat_endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field("image_endpoint", &self.image_endpoint)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("font_family", &self.font_family)
            .field("slide_width", &self.slide_width)
            .field("slide_height", &self.slide_height)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The outline system prompt in effect.
    pub fn outline_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_OUTLINE_PROMPT)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn chat_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.chat_endpoint = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn image_size(mut self, size: impl Into<String>) -> Self {
        self.config.image_size = size.into();
        self
    }

    pub fn image_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.image_endpoint = url.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.config.font_family = family.into();
        self
    }

    /// Slide size in inches.
    pub fn slide_size_inches(mut self, width: f64, height: f64) -> Self {
        self.config.slide_width = (width * EMU_PER_INCH as f64).round() as i64;
        self.config.slide_height = (height * EMU_PER_INCH as f64).round() as i64;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, PptGenError> {
        let c = &self.config;
        if parse_image_size(&c.image_size).is_none() {
            return Err(PptGenError::InvalidConfig(format!(
                "image size must look like 1024x1024, got '{}'",
                c.image_size
            )));
        }
        // PresentationML bounds: 1 in ..= 56 in per side.
        let range = EMU_PER_INCH..=56 * EMU_PER_INCH;
        if !range.contains(&c.slide_width) || !range.contains(&c.slide_height) {
            return Err(PptGenError::InvalidConfig(format!(
                "slide size must be 1–56 inches per side, got {}×{} EMU",
                c.slide_width, c.slide_height
            )));
        }
        if c.font_family.trim().is_empty() {
            return Err(PptGenError::InvalidConfig("font family must not be empty".into()));
        }
        if c.api_timeout_secs == 0 || c.download_timeout_secs == 0 {
            return Err(PptGenError::InvalidConfig("timeouts must be ≥ 1 second".into()));
        }
        Ok(self.config)
    }
}

/// Parse a `WIDTHxHEIGHT` image size.
pub fn parse_image_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.trim().split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GenerationConfig::builder().build().expect("defaults build");
        assert_eq!(config.image_size, "1024x1024");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.slide_height, 7 * EMU_PER_INCH + EMU_PER_INCH / 2);
    }

    #[test]
    fn concurrency_clamped_to_one() {
        let config = GenerationConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn bad_image_size_rejected() {
        let err = GenerationConfig::builder().image_size("huge").build().unwrap_err();
        assert!(matches!(err, PptGenError::InvalidConfig(_)));
    }

    #[test]
    fn slide_size_in_inches() {
        let config = GenerationConfig::builder()
            .slide_size_inches(10.0, 7.5)
            .build()
            .unwrap();
        assert_eq!(config.slide_width, 9_144_000);
        assert_eq!(config.slide_height, 6_858_000);
    }

    #[test]
    fn oversized_slide_rejected() {
        let result = GenerationConfig::builder().slide_size_inches(80.0, 7.5).build();
        assert!(result.is_err());
    }

    #[test]
    fn parse_image_size_variants() {
        assert_eq!(parse_image_size("1024x1024"), Some((1024, 1024)));
        assert_eq!(parse_image_size("1792X1024"), Some((1792, 1024)));
        assert_eq!(parse_image_size("0x10"), None);
        assert_eq!(parse_image_size("1024"), None);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = GenerationConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn custom_system_prompt_overrides_default() {
        let config = GenerationConfig::builder().system_prompt("mine").build().unwrap();
        assert_eq!(config.outline_prompt(), "mine");
        let default = GenerationConfig::default();
        assert!(default.outline_prompt().contains("[SLIDE]"));
    }
}
