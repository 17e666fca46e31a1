//! End-to-end integration tests for text2carousel.
//!
//! The external collaborators (the model call and the slide renderer) are
//! replaced with scripted doubles, so the whole suite runs offline and in
//! CI without API keys. Every pipeline stage in between runs for real:
//! prompt building, JSON extraction, validation, markup, the bounded pool,
//! and both assemblers.

use async_trait::async_trait;
use serde_json::json;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use text2carousel::{
    flatten_post, generate_post, render_slides_to_pdf, render_slides_to_zip,
    render_slides_to_zip_stream, GenerationRequest, ModelCallError, ModelClient, RenderCallError,
    RenderOptions, RenderPreset, SlideMarkup, SlideRenderer, StructuredPostOutput,
    StructuredSlide, Viewport, POST_BACKGROUND_PALETTE,
};
use tokio::time::sleep;
use tokio_stream::StreamExt;

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Scripted model client: canned responses in order, call counting.
struct ScriptedModel {
    responses: Mutex<Vec<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> Result<String, ModelCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        assert!(
            !responses.is_empty(),
            "model called more times than the script allows"
        );
        responses.remove(0).map_err(ModelCallError::new)
    }
}

/// Renderer that stamps each result with its slide position and completes
/// renders in reverse slide order.
struct ReverseCompletionRenderer {
    total: usize,
}

#[async_trait]
impl SlideRenderer for ReverseCompletionRenderer {
    async fn render(
        &self,
        markup: &SlideMarkup,
        _viewport: Viewport,
    ) -> Result<Vec<u8>, RenderCallError> {
        let position = badge_position(markup, self.total);
        sleep(Duration::from_millis(
            8 * (self.total - position + 1) as u64,
        ))
        .await;
        Ok(format!("image-for-slide-{position}").into_bytes())
    }
}

/// Renderer producing real PNG bytes, for the PDF path.
struct PngRenderer;

#[async_trait]
impl SlideRenderer for PngRenderer {
    async fn render(
        &self,
        _markup: &SlideMarkup,
        viewport: Viewport,
    ) -> Result<Vec<u8>, RenderCallError> {
        // A tiny image is enough; the assembler never requires the render
        // to match the viewport pixel-for-pixel.
        let side = (viewport.width / 270).max(2);
        let img = image::RgbImage::from_pixel(side, side, image::Rgb([40, 60, 80]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| RenderCallError::new(e.to_string()))?;
        Ok(bytes)
    }
}

/// Recover the slide position from the markup's slide-number badge.
fn badge_position(markup: &SlideMarkup, total: usize) -> usize {
    (1..=total)
        .find(|p| markup.html.contains(&format!(">{p} / {total}<")))
        .expect("markup carries a slide-number badge")
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn strict_model_payload() -> String {
    let mut slides = vec![json!({
        "type": "hero",
        "title": "Inside a render pipeline",
        "subtitle": "From raw text to shipped carousel"
    })];
    slides.push(json!({"type": "paragraph", "title": "The problem", "text": "Model output is messy."}));
    slides.push(json!({
        "type": "explanation",
        "title": "What matters",
        "points": ["Systems are hard", "Latency matters"],
        "highlight": ["hard", "nonexistent"]
    }));
    slides.push(json!({
        "type": "flow",
        "steps": ["Extract text", "Prompt model", "Validate output", "Render slides"]
    }));
    for i in 0..5 {
        slides.push(json!({
            "type": "paragraph",
            "title": format!("Lesson {}", i + 1),
            "text": "One concrete takeaway."
        }));
    }
    slides.push(json!({"type": "cta", "text": "Follow for part two"}));

    json!({
        "slides": slides,
        "caption": "How we built it.\n\nAll the sharp edges included.",
        "hashtags": [
            "#rustlang", "#RustLang", "#systems", "#async", "#tokio",
            "#pipelines", "#llm", "#carousel", "#engineering"
        ]
    })
    .to_string()
}

fn request() -> GenerationRequest {
    GenerationRequest::new("a long extracted document text", 10).with_tone("direct")
}

fn zip_entry_names(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

// ── Generation pipeline ──────────────────────────────────────────────────────

#[tokio::test]
async fn generation_accepts_noisy_but_valid_model_output() {
    let noisy = format!(
        "Sure, here's your carousel!\n```json\n{}\n```\nHope it lands well.",
        strict_model_payload()
    );
    let model = ScriptedModel::new(vec![Ok(noisy)]);

    let post = generate_post(&model, &request()).await.unwrap();
    assert_eq!(model.calls(), 1);
    assert_eq!(post.slides.len(), 10);
    assert_eq!(post.slides[0].type_name(), "hero");
    assert_eq!(post.slides[9].type_name(), "cta");
    assert!(post.slides[3..6].iter().any(StructuredSlide::is_flow));

    // Hashtags: case-insensitive dedup dropped the #RustLang double.
    assert_eq!(post.hashtags.len(), 8);
    assert_eq!(post.hashtags[0], "#rustlang");

    // Highlight repair kept only the matching entry.
    match &post.slides[2] {
        StructuredSlide::Explanation { highlight, .. } => {
            assert_eq!(highlight, &vec!["hard".to_string()])
        }
        other => panic!("slide 3 should be an explanation, got {}", other.type_name()),
    }

    // Derived theme comes from the fixed palette.
    assert!(POST_BACKGROUND_PALETTE.contains(&post.theme.background_color.as_str()));
}

#[tokio::test]
async fn unbalanced_json_is_retried_once_and_recovers() {
    let model = ScriptedModel::new(vec![
        Ok("{\"slides\": [{\"type\": \"hero\"".to_string()),
        Ok(strict_model_payload()),
    ]);

    let post = generate_post(&model, &request()).await.unwrap();
    assert_eq!(model.calls(), 2, "exactly one retry");
    assert_eq!(post.slides.len(), 10);
}

#[tokio::test]
async fn business_rule_violation_fails_without_a_second_model_call() {
    // Valid JSON and valid slide types, but the slide count breaks the
    // ceiling: terminal on first occurrence.
    let model = ScriptedModel::new(vec![
        Ok(strict_model_payload()),
        Ok(strict_model_payload()),
    ]);
    let short_request = GenerationRequest::new("text", 5);

    let err = generate_post(&model, &short_request).await.unwrap_err();
    assert_eq!(err.code(), "slide_count");
    assert_eq!(model.calls(), 1, "terminal failures must not retry");
}

#[tokio::test]
async fn two_shape_failures_exhaust_the_retry_budget() {
    let model = ScriptedModel::new(vec![
        Ok("not json".to_string()),
        Ok("also not json".to_string()),
    ]);

    let err = generate_post(&model, &request()).await.unwrap_err();
    assert_eq!(err.code(), "malformed_json");
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn transport_failure_is_terminal_immediately() {
    let model = ScriptedModel::new(vec![Err("connection refused".to_string())]);
    let err = generate_post(&model, &request()).await.unwrap_err();
    assert_eq!(err.code(), "model_call");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn theme_derivation_is_stable_across_runs() {
    let model_a = ScriptedModel::new(vec![Ok(strict_model_payload())]);
    let model_b = ScriptedModel::new(vec![Ok(strict_model_payload())]);
    let post_a = generate_post(&model_a, &request()).await.unwrap();
    let post_b = generate_post(&model_b, &request()).await.unwrap();
    assert_eq!(post_a.theme, post_b.theme);
}

// ── Rendering and assembly ───────────────────────────────────────────────────

fn rendered_post() -> StructuredPostOutput {
    let model_output = strict_model_payload();
    text2carousel::validate_model_output(&model_output, 10).unwrap()
}

#[tokio::test]
async fn reverse_render_completion_preserves_archive_order() {
    let post = rendered_post();
    let total = post.slides.len();
    let options = RenderOptions::builder().concurrency(total).build().unwrap();

    let bytes = render_slides_to_zip(
        &post.slides,
        &post.theme,
        Arc::new(ReverseCompletionRenderer { total }),
        &options,
    )
    .await
    .unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), total);
    for index in 0..total {
        let mut entry = archive.by_index(index).unwrap();
        assert_eq!(entry.name(), format!("slide-{:02}.png", index + 1));
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, format!("image-for-slide-{}", index + 1));
    }
}

#[tokio::test]
async fn default_concurrency_also_yields_ordered_entries() {
    let post = rendered_post();
    let total = post.slides.len();

    let bytes = render_slides_to_zip(
        &post.slides,
        &post.theme,
        Arc::new(ReverseCompletionRenderer { total }),
        &RenderOptions::default(),
    )
    .await
    .unwrap();

    let names = zip_entry_names(bytes);
    let expected: Vec<String> = (1..=total).map(|p| format!("slide-{p:02}.png")).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn archive_stream_surfaces_render_failure_as_error_item() {
    struct FailOnThird {
        total: usize,
    }

    #[async_trait]
    impl SlideRenderer for FailOnThird {
        async fn render(
            &self,
            markup: &SlideMarkup,
            _viewport: Viewport,
        ) -> Result<Vec<u8>, RenderCallError> {
            if badge_position(markup, self.total) == 3 {
                Err(RenderCallError::new("tab crashed"))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    let post = rendered_post();
    let total = post.slides.len();
    let mut stream = render_slides_to_zip_stream(
        post.slides.clone(),
        post.theme.clone(),
        Arc::new(FailOnThird { total }),
        RenderOptions::default(),
    )
    .unwrap();

    let mut saw_error = false;
    while let Some(item) = stream.next().await {
        if let Err(err) = item {
            assert!(err.to_string().contains("tab crashed"));
            saw_error = true;
        }
    }
    assert!(saw_error, "the stream must end with the classified failure");
}

#[tokio::test]
async fn pdf_document_has_one_page_per_slide_for_both_presets() {
    let post = rendered_post();

    for preset in [RenderPreset::Square, RenderPreset::LinkedIn] {
        let options = RenderOptions::builder().preset(preset).build().unwrap();
        let bytes = render_slides_to_pdf(&post.slides, &post.theme, Arc::new(PngRenderer), &options)
            .await
            .unwrap();

        assert!(bytes.starts_with(b"%PDF-"), "missing PDF signature");
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), post.slides.len(), "preset {preset:?}");
    }
}

#[tokio::test]
async fn archive_round_trips_through_disk() {
    let post = rendered_post();
    let total = post.slides.len();
    let bytes = render_slides_to_zip(
        &post.slides,
        &post.theme,
        Arc::new(ReverseCompletionRenderer { total }),
        &RenderOptions::default(),
    )
    .await
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slides.zip");
    std::fs::write(&path, &bytes).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), total);
    assert_eq!(archive.by_index(0).unwrap().name(), "slide-01.png");
}

// ── End-to-end: generation feeding assembly ──────────────────────────────────

#[tokio::test]
async fn generated_post_flows_through_to_a_packaged_archive() {
    let model = ScriptedModel::new(vec![Ok(strict_model_payload())]);
    let post = generate_post(&model, &request()).await.unwrap();
    let total = post.slides.len();

    let bytes = render_slides_to_zip(
        &post.slides,
        &post.theme,
        Arc::new(ReverseCompletionRenderer { total }),
        &RenderOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(zip_entry_names(bytes).len(), total);

    // The flat preview adapter covers every slide of the validated post.
    let flat = flatten_post(&post);
    assert_eq!(flat.slides.len(), total);
    assert_eq!(flat.slides[0].headline, "Inside a render pipeline");
    assert_eq!(flat.slides[total - 1].headline, "Final Thought");
}
