//! CLI binary for edgequake-pptgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, runs one build and stores the deck.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pptgen::{
    parse_outline, BuildOutput, BuildProgressCallback, DocumentStore, GenerationConfig, Generator,
    PptGenError, ProgressCallback, DEFAULT_DOCUMENT_PATH,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the outline is written, then a bar over the mind-maps.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} mind-maps  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Resolving");
        self.bar.reset_eta();
    }
}

impl BuildProgressCallback for CliProgressCallback {
    fn on_outline_start(&self, topic: &str) {
        self.bar.set_prefix("Outline");
        self.bar.set_message(format!("writing slides for \"{topic}\"…"));
    }

    fn on_outline_complete(&self, outline_len: usize) {
        self.bar.println(format!(
            "{} Outline ready  {}",
            cyan("◆"),
            dim(&format!("{outline_len} bytes"))
        ));
    }

    fn on_build_start(&self, slides: usize, mindmaps: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{slides} slides, {mindmaps} mind-map(s)"))
        ));
        if mindmaps > 0 {
            self.activate_bar(mindmaps);
        } else {
            self.bar.set_prefix("Rendering");
            self.bar.set_message("");
        }
    }

    fn on_mindmap_start(&self, _ordinal: usize, _total: usize, title: &str) {
        self.bar.set_message(title.to_string());
    }

    fn on_mindmap_complete(&self, ordinal: usize, total: usize, title: &str) {
        self.bar.println(format!(
            "  {} Mind-map {:>2}/{:<2}  {}",
            green("✓"),
            ordinal + 1,
            total,
            title
        ));
        self.bar.inc(1);
    }

    fn on_mindmap_error(&self, ordinal: usize, total: usize, title: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Mind-map {:>2}/{:<2}  {}  {}",
            red("✗"),
            ordinal + 1,
            total,
            title,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_build_complete(&self, rendered_slides: usize, resolved: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} slides rendered ({} mind-map image(s))",
                green("✔"),
                bold(&rendered_slides.to_string()),
                resolved
            );
        } else {
            eprintln!(
                "{} {} slides rendered  ({} mind-map(s) failed)",
                cyan("⚠"),
                bold(&rendered_slides.to_string()),
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a deck and store it in static/generated_ppt.pptx
  pptgen generate "Ownership in Rust"

  # Seed the outline with reference material
  pptgen generate "Quarterly review" --reference-file notes.txt

  # Edit the printed outline, then rebuild the same deck
  pptgen generate "Ownership in Rust" > outline.txt
  $EDITOR outline.txt
  pptgen update outline.txt

  # Copy the stored deck somewhere else
  pptgen download --dest ~/Desktop/ownership.pptx

  # Check how an outline parses (no API key needed)
  pptgen parse outline.txt

OUTLINE MARKUP (one tag per line):
  [SLIDE]                 start a new slide (the first one is the cover)
  [TITLE]text             slide title
  [SUBTITLE]text          cover subtitle / body text on other slides
  [CONTENT]               start of the body
  - text                  bullet
  [IMAGE]description      grey placeholder box
  [MINDMAP]title|ref      extra slide with a generated mind-map image

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for chat completions and image generation
  API_REQUEST_URL         OpenAI-compatible chat-completions URL (bypasses provider detection)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override chat model ID
  PPTGEN_STORE            Where the deck is stored
"#;

/// Generate PowerPoint decks from a topic using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pptgen",
    version,
    about = "Generate PowerPoint decks from a topic using an LLM",
    long_about = "Ask an LLM for a tagged slide outline, render it to a .pptx deck, and \
rebuild the deck from edited outlines. Mind-map slides are drawn by an image model.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an outline for TOPIC, build the deck and store it.
    Generate {
        /// Presentation topic.
        topic: String,

        /// Reference material appended to the outline prompt.
        #[arg(long, conflicts_with = "reference_file")]
        reference: Option<String>,

        /// Read reference material from a file.
        #[arg(long)]
        reference_file: Option<PathBuf>,

        /// Print the build result as JSON instead of the outline.
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the stored deck from an edited outline (file or `-` for stdin).
    Update {
        outline: String,

        /// Print the build result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Copy the stored deck to DEST.
    Download {
        #[arg(long, default_value = "generated_ppt.pptx")]
        dest: PathBuf,
    },

    /// Parse an outline (file or `-` for stdin) and print the slide records as JSON.
    Parse { outline: String },
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Where the generated deck is stored.
    #[arg(long, global = true, env = "PPTGEN_STORE", default_value = DEFAULT_DOCUMENT_PATH)]
    store: PathBuf,

    /// Chat model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// OpenAI-compatible chat-completions URL.
    #[arg(long, global = true, env = "API_REQUEST_URL")]
    api_url: Option<String>,

    /// Bearer token for the chat and image endpoints.
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Image model used for mind-maps.
    #[arg(long, global = true, env = "PPTGEN_IMAGE_MODEL", default_value = "dall-e-3")]
    image_model: String,

    /// Mind-map image size, WIDTHxHEIGHT.
    #[arg(long, global = true, env = "PPTGEN_IMAGE_SIZE", default_value = "1024x1024")]
    image_size: String,

    /// OpenAI-compatible image-generation URL.
    #[arg(long, global = true, env = "PPTGEN_IMAGE_URL")]
    image_url: Option<String>,

    /// Mind-maps resolved in parallel.
    #[arg(short, long, global = true, env = "PPTGEN_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PPTGEN_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max output tokens per completion.
    #[arg(long, global = true, env = "PPTGEN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries for the outline request.
    #[arg(long, global = true, env = "PPTGEN_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Typeface for all slide text.
    #[arg(long, global = true, env = "PPTGEN_FONT", default_value = "Microsoft YaHei")]
    font: String,

    /// Path to a text file containing a custom outline system prompt.
    #[arg(long, global = true, env = "PPTGEN_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Per-call API timeout in seconds.
    #[arg(long, global = true, env = "PPTGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Image download timeout in seconds.
    #[arg(long, global = true, env = "PPTGEN_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "PPTGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PPTGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PPTGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    let json = matches!(
        cli.command,
        Command::Generate { json: true, .. } | Command::Update { json: true, .. }
    );
    let builds = matches!(cli.command, Command::Generate { .. } | Command::Update { .. });
    let show_progress = builds && !opts.quiet && !opts.no_progress && !json;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is shown.
    let filter = if opts.verbose {
        "debug"
    } else if opts.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store = DocumentStore::new(&opts.store);

    match &cli.command {
        Command::Parse { outline } => {
            let text = read_outline(outline)?;
            let records = parse_outline(&text);
            println!(
                "{}",
                serde_json::to_string_pretty(&records).context("Failed to serialise records")?
            );
        }

        Command::Download { dest } => {
            let bytes = match store.open() {
                Ok(bytes) => bytes,
                Err(e @ PptGenError::DocumentNotFound { .. }) => {
                    eprintln!("{} {}", red("✘"), e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e).context("Failed to read stored deck"),
            };
            std::fs::write(dest, &bytes)
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            if !opts.quiet {
                eprintln!(
                    "{} {} bytes  →  {}",
                    green("✔"),
                    bytes.len(),
                    bold(&dest.display().to_string())
                );
            }
        }

        Command::Generate {
            topic,
            reference,
            reference_file,
            json,
        } => {
            let reference = match reference_file {
                Some(path) => Some(
                    tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("Failed to read reference from {:?}", path))?,
                ),
                None => reference.clone(),
            };
            let generator = Generator::from_config(build_config(opts, show_progress).await?)
                .context("Failed to set up LLM services")?;
            let (output, path) = generator
                .build_to_store(topic, reference.as_deref(), &store)
                .await
                .context("Generation failed")?;
            report(&output, &path, *json, opts.quiet)?;
        }

        Command::Update { outline, json } => {
            let text = read_outline(outline)?;
            let generator = Generator::from_config(build_config(opts, show_progress).await?)
                .context("Failed to set up LLM services")?;
            let (output, path) = generator
                .rebuild_to_store(&text, &store)
                .await
                .context("Rebuild failed")?;
            report(&output, &path, *json, opts.quiet)?;
        }
    }

    Ok(())
}

/// Print the outline (or JSON) on stdout and a summary on stderr.
fn report(output: &BuildOutput, path: &Path, json: bool, quiet: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.outline.as_bytes())
        .context("Failed to write to stdout")?;
    if !output.outline.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }

    if quiet {
        return Ok(());
    }
    for b in &output.bindings {
        let status = match (&b.url, &b.error) {
            (_, Some(e)) => red(&e.to_string()),
            (Some(url), None) => url.clone(),
            (None, None) => dim("inline image"),
        };
        eprintln!("   mind-map {:<24} {}", b.title, status);
    }
    eprintln!(
        "{}  {} slides  {}ms  →  {}",
        if output.stats.mindmaps_failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        output.stats.rendered_slides,
        output.stats.total_duration_ms,
        bold(&path.display().to_string()),
    );
    Ok(())
}

/// Read an outline from a file, or stdin when `source` is `-`.
fn read_outline(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read outline from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read outline {source}"))
    }
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(opts: &GlobalOpts, show_progress: bool) -> Result<GenerationConfig> {
    let system_prompt = match opts.system_prompt {
        Some(ref path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        ),
        None => None,
    };

    let mut builder = GenerationConfig::builder()
        .image_model(opts.image_model.as_str())
        .image_size(opts.image_size.as_str())
        .concurrency(opts.concurrency)
        .temperature(opts.temperature)
        .max_tokens(opts.max_tokens)
        .max_retries(opts.max_retries)
        .font_family(opts.font.as_str())
        .api_timeout_secs(opts.api_timeout)
        .download_timeout_secs(opts.download_timeout);

    if let Some(ref model) = opts.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = opts.provider {
        builder = builder.provider_name(provider.as_str());
    }
    if let Some(ref url) = opts.api_url {
        builder = builder.chat_endpoint(url.as_str());
    }
    if let Some(ref key) = opts.api_key {
        builder = builder.api_key(key.as_str());
    }
    if let Some(ref url) = opts.image_url {
        builder = builder.image_endpoint(url.as_str());
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
