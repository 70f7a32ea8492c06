//! End-to-end builds over in-process fake services.
//!
//! No network: the completion fake answers outline and mind-map requests
//! from fixed text, and the image fake serves a small PNG.

use async_trait::async_trait;
use edgequake_pptgen::{
    parse_outline, to_markup, BuildProgressCallback, CompletionService, DocumentStore,
    GeneratedImage, GenerationConfig, Generator, ImageService, MindmapError, PptGenError,
    PromptMessage, ServiceError,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const OUTLINE: &str = "[SLIDE]\n[TITLE]Intro\n[SUBTITLE]Welcome\n\
[SLIDE]\n[TITLE]Details\n[CONTENT]\n- point A\n- point B\n[IMAGE]a chart";

fn tiny_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([20, 40, 60, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Outline requests get `outline`; mind-map requests get a block unless the
/// instruction mentions "broken".
struct Canned {
    outline: String,
    calls: AtomicUsize,
}

impl Canned {
    fn new(outline: &str) -> Arc<Self> {
        Arc::new(Self {
            outline: outline.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CompletionService for Canned {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = &messages[messages.len() - 1].content;
        if !user.contains("@startmindmap") {
            return Ok(self.outline.clone());
        }
        if user.contains("broken") {
            return Err(ServiceError::status(500, "mind-map backend down"));
        }
        Ok("@startmindmap\n* root\n** leaf\n@endmindmap".to_string())
    }
}

struct PngImages {
    fetched: AtomicUsize,
}

#[async_trait]
impl ImageService for PngImages {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ServiceError> {
        Ok(GeneratedImage::Url("https://images.test/mindmap.png".to_string()))
    }

    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ServiceError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        Ok(tiny_png())
    }
}

fn generator(outline: &str, config: GenerationConfig) -> (Generator, Arc<Canned>, Arc<PngImages>) {
    let completion = Canned::new(outline);
    let images = Arc::new(PngImages {
        fetched: AtomicUsize::new(0),
    });
    let gen = Generator::new(config, completion.clone(), images.clone());
    (gen, completion, images)
}

fn quick_config() -> GenerationConfig {
    GenerationConfig::builder()
        .max_retries(0)
        .retry_backoff_ms(1)
        .build()
        .unwrap()
}

fn open_zip(bytes: &[u8]) -> zip::ZipArchive<Cursor<Vec<u8>>> {
    zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap()
}

fn slide_xml(bytes: &[u8], number: usize) -> String {
    let mut archive = open_zip(bytes);
    let mut file = archive
        .by_name(&format!("ppt/slides/slide{number}.xml"))
        .unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

fn slide_parts(bytes: &[u8]) -> usize {
    let archive = open_zip(bytes);
    archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count()
}

#[tokio::test]
async fn two_slide_outline_builds_cover_and_content() {
    let (gen, _, images) = generator(OUTLINE, quick_config());
    let output = gen.build_from_topic("Intro", None).await.unwrap();

    assert_eq!(output.slides.len(), 2);
    assert_eq!(output.stats.rendered_slides, 2);
    assert_eq!(output.document.slide_count, 2);
    assert_eq!(slide_parts(&output.document.bytes), 2);
    assert!(output.bindings.is_empty());
    assert_eq!(images.fetched.load(Ordering::SeqCst), 0);

    let cover = slide_xml(&output.document.bytes, 1);
    assert!(cover.contains("<a:t>Intro</a:t>"));
    assert!(cover.contains("<a:t>Welcome</a:t>"));

    let details = slide_xml(&output.document.bytes, 2);
    assert!(details.contains("<a:t>Details</a:t>"));
    let a = details.find("- point A").unwrap();
    let b = details.find("- point B").unwrap();
    assert!(a < b, "bullets keep their order");
    assert!(details.contains("[image: a chart]"));
    assert!(details.contains("F0F0F0"));
}

#[tokio::test]
async fn image_placeholders_stack_downwards() {
    let outline = "[SLIDE]\n[TITLE]Cover\n[SLIDE]\n[TITLE]Pics\n[IMAGE]first\n[IMAGE]second";
    let (gen, _, _) = generator(outline, quick_config());
    let output = gen.rebuild_from_outline(outline).await.unwrap();

    let xml = slide_xml(&output.document.bytes, 2);
    let first = xml.find("[image: first]").unwrap();
    let second = xml.find("[image: second]").unwrap();
    assert!(first < second);

    // y offsets of the two boxes, in document order
    let offsets: Vec<i64> = xml
        .match_indices("<a:off x=\"")
        .filter_map(|(i, _)| {
            let rest = &xml[i..];
            let y = rest.split("y=\"").nth(1)?;
            y.split('"').next()?.parse().ok()
        })
        .collect();
    let boxes = &offsets[offsets.len() - 2..];
    assert!(boxes[1] > boxes[0]);
}

#[tokio::test]
async fn mindmaps_get_their_own_slides_in_declaration_order() {
    let outline = "[SLIDE]\n[TITLE]Cover\n\
[SLIDE]\n[TITLE]Tides\n[MINDMAP]Moon|gravity\n[MINDMAP]Sun|heat\n\
[SLIDE]\n[TITLE]Closing";
    let (gen, completion, images) = generator(outline, quick_config());
    let output = gen.rebuild_from_outline(outline).await.unwrap();

    // cover, Tides, Moon, Sun, Closing
    assert_eq!(output.stats.rendered_slides, 5);
    assert_eq!(output.stats.mindmaps_total, 2);
    assert_eq!(output.stats.mindmaps_resolved, 2);
    assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
    assert_eq!(images.fetched.load(Ordering::SeqCst), 2);

    let titles: Vec<&str> = output.bindings.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Moon", "Sun"]);
    assert!(output
        .bindings
        .iter()
        .all(|b| b.url.as_deref() == Some("https://images.test/mindmap.png")));

    let bytes = &output.document.bytes;
    assert!(slide_xml(bytes, 3).contains("mind-map: Moon"));
    assert!(slide_xml(bytes, 3).contains("<p:pic>"));
    assert!(slide_xml(bytes, 4).contains("mind-map: Sun"));
    assert!(slide_xml(bytes, 5).contains("<a:t>Closing</a:t>"));

    let mut archive = open_zip(bytes);
    assert!(archive.by_name("ppt/media/image1.png").is_ok());
    assert!(archive.by_name("ppt/media/image2.png").is_ok());
}

#[tokio::test]
async fn failed_mindmap_renders_placeholder_and_build_succeeds() {
    let outline = "[SLIDE]\n[TITLE]Cover\n[SLIDE]\n[TITLE]Ops\n[MINDMAP]Outage|broken pipeline";
    let (gen, _, images) = generator(outline, quick_config());
    let output = gen.rebuild_from_outline(outline).await.unwrap();

    assert_eq!(output.stats.rendered_slides, 3);
    assert_eq!(output.stats.mindmaps_failed, 1);
    assert_eq!(images.fetched.load(Ordering::SeqCst), 0);

    let binding = &output.bindings[0];
    assert!(binding.url.is_none());
    assert!(matches!(binding.error, Some(MindmapError::CompletionFailed { .. })));

    let xml = slide_xml(&output.document.bytes, 3);
    assert!(xml.contains("mind-map generation failed"));
    assert!(!xml.contains("<p:pic>"));
}

#[tokio::test]
async fn outline_failure_is_fatal() {
    struct Down;

    #[async_trait]
    impl CompletionService for Down {
        async fn complete(&self, _: &[PromptMessage]) -> Result<String, ServiceError> {
            Err(ServiceError::status(503, "unavailable"))
        }
    }

    let gen = Generator::new(
        quick_config(),
        Arc::new(Down),
        Arc::new(PngImages {
            fetched: AtomicUsize::new(0),
        }),
    );
    let err = gen.build_from_topic("anything", None).await.unwrap_err();
    assert!(matches!(err, PptGenError::LlmApiError { .. }));
}

#[tokio::test]
async fn rebuild_to_store_then_open() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::new(dir.path().join("static").join("generated_ppt.pptx"));
    assert!(matches!(store.open(), Err(PptGenError::DocumentNotFound { .. })));

    let (gen, completion, _) = generator(OUTLINE, quick_config());
    let (output, path) = gen.rebuild_to_store(OUTLINE, &store).await.unwrap();

    assert_eq!(path, store.path());
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0, "rebuild skips the outline call");
    assert_eq!(store.open().unwrap(), output.document.bytes);
}

#[tokio::test]
async fn empty_outline_yields_empty_valid_deck() {
    let (gen, _, _) = generator("", quick_config());
    let output = gen.rebuild_from_outline("").await.unwrap();
    assert_eq!(output.stats.rendered_slides, 0);
    let mut archive = open_zip(&output.document.bytes);
    assert!(archive.by_name("ppt/presentation.xml").is_ok());
    assert_eq!(slide_parts(&output.document.bytes), 0);
}

#[tokio::test]
async fn progress_callbacks_fire_in_order() {
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl BuildProgressCallback for Recorder {
        fn on_outline_start(&self, _topic: &str) {
            self.0.lock().unwrap().push("outline".into());
        }
        fn on_build_start(&self, slides: usize, mindmaps: usize) {
            self.0.lock().unwrap().push(format!("build {slides}/{mindmaps}"));
        }
        fn on_mindmap_complete(&self, ordinal: usize, _total: usize, title: &str) {
            self.0.lock().unwrap().push(format!("ok {ordinal} {title}"));
        }
        fn on_mindmap_error(&self, ordinal: usize, _total: usize, title: &str, _error: &str) {
            self.0.lock().unwrap().push(format!("err {ordinal} {title}"));
        }
        fn on_build_complete(&self, rendered: usize, resolved: usize) {
            self.0.lock().unwrap().push(format!("done {rendered}/{resolved}"));
        }
    }

    let outline = "[SLIDE]\n[TITLE]Cover\n[MINDMAP]Good|fine\n[MINDMAP]Bad|broken";
    let recorder = Arc::new(Recorder::default());
    let config = GenerationConfig::builder()
        .max_retries(0)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let (gen, _, _) = generator(outline, config);
    gen.build_from_topic("Cover", None).await.unwrap();

    let events = recorder.0.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["outline", "build 1/2", "ok 0 Good", "err 1 Bad", "done 3/1"]
    );
}

#[test]
fn markup_survives_a_round_trip() {
    let records = parse_outline(
        "[SLIDE]\n[TITLE]Intro\n[SUBTITLE]Welcome\n\
[SLIDE]\n[TITLE]Details\n[CONTENT]\n- point A\n[IMAGE]a chart\n[MINDMAP]Map|ref text",
    );
    assert_eq!(parse_outline(&to_markup(&records)), records);
}
