//! Slide markup building: one self-contained HTML document per slide.
//!
//! The external render collaborator turns this markup into pixels; nothing
//! else sees it. Everything the renderer needs (viewport-sized frame, theme
//! background, fonts, per-variant layout) is inlined so a render call needs
//! no network access beyond loading the document itself.
//!
//! The builder is also the last line of defence for structurally broken
//! slides that bypassed validation (hand-constructed sequences): a flow
//! slide with zero or more than six steps, an explanation with no points, or
//! a diagram with no nodes fails packaging with a classified error instead
//! of rendering nonsense.

use crate::config::RenderPreset;
use crate::error::AssemblyError;
use crate::post::{
    CtaVariant, ExplanationVariant, FlowVariant, HeroVariant, PostTheme, StructuredSlide,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Flow slides can render at most this many steps.
const MAX_RENDER_STEPS: usize = 6;

static RE_MULTI_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// The HTML for one slide, ready for the external renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideMarkup {
    pub html: String,
}

/// Build the markup for one slide.
///
/// `index` is 0-based; the rendered slide-number badge shows `index + 1` of
/// `total`.
pub fn build_slide_markup(
    slide: &StructuredSlide,
    theme: &PostTheme,
    preset: RenderPreset,
    index: usize,
    total: usize,
) -> Result<SlideMarkup, AssemblyError> {
    let position = index + 1;
    let body = slide_body(slide, position)?;
    let (width, height) = preset.dimensions();

    let html = format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <style>
      * {{ box-sizing: border-box; }}
      html, body {{
        width: {width}px;
        height: {height}px;
        margin: 0;
        padding: 0;
        background: {background};
      }}
      body {{
        font-family: ui-sans-serif, system-ui, -apple-system, "Segoe UI", Arial, sans-serif;
        color: #f8fafc;
      }}
      .frame {{
        width: {width}px;
        height: {height}px;
        padding: 96px;
        display: flex;
        flex-direction: column;
        justify-content: center;
        gap: 28px;
        position: relative;
        overflow: hidden;
      }}
      .frame.center {{ align-items: center; text-align: center; }}
      .slide-number {{
        position: absolute;
        top: 40px;
        right: 40px;
        font-size: 18px;
        color: #94a3b8;
      }}
      .title {{
        font-size: 64px;
        line-height: 1.08;
        letter-spacing: -0.02em;
        font-weight: 700;
        margin: 0;
        word-break: break-word;
        overflow-wrap: anywhere;
      }}
      .subtitle, .text {{
        font-size: 30px;
        line-height: 1.35;
        font-weight: 500;
        margin: 0;
        color: #cbd5e1;
        word-break: break-word;
        overflow-wrap: anywhere;
      }}
      .text.minimal {{ font-size: 24px; font-weight: 400; }}
      ol.steps {{
        margin: 0;
        padding-left: 44px;
        font-size: 32px;
        line-height: 1.6;
      }}
      ol.steps.grid {{
        display: grid;
        grid-template-columns: 1fr 1fr;
        column-gap: 48px;
        list-style-position: inside;
        padding-left: 0;
      }}
      ul.points {{
        margin: 0;
        padding-left: 36px;
        font-size: 30px;
        line-height: 1.5;
      }}
      ul.points.cards {{
        list-style: none;
        padding: 0;
        display: flex;
        flex-direction: column;
        gap: 20px;
      }}
      ul.points.cards li {{
        background: rgba(255, 255, 255, 0.06);
        border-radius: 16px;
        padding: 24px;
      }}
      mark {{
        background: transparent;
        color: #38bdf8;
        font-weight: 700;
      }}
      .nodes {{
        display: flex;
        flex-wrap: wrap;
        align-items: center;
        gap: 16px;
        font-size: 28px;
      }}
      .nodes .node {{
        background: rgba(255, 255, 255, 0.08);
        border-radius: 12px;
        padding: 14px 22px;
      }}
      .nodes .arrow {{ color: #64748b; }}
    </style>
  </head>
  <body>
    <div class="frame{frame_class}">
      <div class="slide-number">{position} / {total}</div>
{body}
    </div>
  </body>
</html>"#,
        background = theme.background_color,
        frame_class = frame_class(slide),
    );

    Ok(SlideMarkup { html })
}

/// Extra frame class for variants that re-align the whole slide.
fn frame_class(slide: &StructuredSlide) -> &'static str {
    match slide {
        StructuredSlide::Hero {
            variant: Some(HeroVariant::Center),
            ..
        } => " center",
        _ => "",
    }
}

fn slide_body(slide: &StructuredSlide, position: usize) -> Result<String, AssemblyError> {
    let invalid = |detail: &str| {
        Err(AssemblyError::InvalidSlide {
            position,
            detail: detail.to_string(),
        })
    };

    match slide {
        StructuredSlide::Hero { title, subtitle, .. } => Ok(format!(
            "      <h1 class=\"title\">{}</h1>\n      <p class=\"subtitle\">{}</p>",
            escape_html(title),
            escape_html(subtitle),
        )),
        StructuredSlide::Flow { variant, steps, .. } => {
            if steps.iter().all(|s| s.trim().is_empty()) {
                return invalid("flow slide has no steps");
            }
            if steps.len() > MAX_RENDER_STEPS {
                return invalid("flow slide has too many steps");
            }
            let class = match variant.unwrap_or_default() {
                FlowVariant::Default => "steps",
                FlowVariant::Grid => "steps grid",
            };
            let items: Vec<String> = steps
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| format!("        <li>{}</li>", escape_html(s)))
                .collect();
            Ok(format!(
                "      <ol class=\"{class}\">\n{}\n      </ol>",
                items.join("\n")
            ))
        }
        StructuredSlide::Explanation {
            variant,
            title,
            points,
            highlight,
        } => {
            if points.iter().all(|p| p.trim().is_empty()) {
                return invalid("explanation slide has no points");
            }
            let class = match variant.unwrap_or_default() {
                ExplanationVariant::Default => "points",
                ExplanationVariant::Cards => "points cards",
            };
            let items: Vec<String> = points
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| format!("        <li>{}</li>", highlight_point(p, highlight)))
                .collect();
            Ok(format!(
                "      <h1 class=\"title\">{}</h1>\n      <ul class=\"{class}\">\n{}\n      </ul>",
                escape_html(title),
                items.join("\n")
            ))
        }
        StructuredSlide::Cta { variant, text, .. } => {
            let class = match variant.unwrap_or_default() {
                CtaVariant::Default => "text",
                CtaVariant::Minimal => "text minimal",
            };
            let lines: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| format!("      <p class=\"{class}\">{}</p>", escape_html(l)))
                .collect();
            Ok(lines.join("\n"))
        }
        StructuredSlide::Paragraph { title, text } => Ok(format!(
            "      <h1 class=\"title\">{}</h1>\n      <p class=\"text\">{}</p>",
            escape_html(title),
            escape_html(text),
        )),
        StructuredSlide::Diagram { title, nodes } => {
            if nodes.iter().all(|n| n.trim().is_empty()) {
                return invalid("diagram slide has no nodes");
            }
            let boxes: Vec<String> = nodes
                .iter()
                .filter(|n| !n.trim().is_empty())
                .map(|n| format!("<span class=\"node\">{}</span>", escape_html(n)))
                .collect();
            Ok(format!(
                "      <h1 class=\"title\">{}</h1>\n      <div class=\"nodes\">{}</div>",
                escape_html(title),
                boxes.join("<span class=\"arrow\">&rarr;</span>"),
            ))
        }
    }
}

/// Escape a point and wrap highlighted substrings in `<mark>`.
///
/// Matching is case-insensitive on the first occurrence of each highlight.
/// Byte offsets from the lowercased haystack are only trusted when they land
/// on character boundaries of the original, so exotic case-folding cannot
/// split a code point.
fn highlight_point(point: &str, highlights: &[String]) -> String {
    let mut rendered = escape_html(point);
    for highlight in highlights {
        let needle = escape_html(highlight);
        let lowered = rendered.to_lowercase();
        let needle_lowered = needle.to_lowercase();
        if lowered.len() != rendered.len() || needle_lowered.len() != needle.len() {
            continue;
        }
        if let Some(at) = lowered.find(&needle_lowered) {
            let end = at + needle.len();
            if rendered.is_char_boundary(at) && rendered.is_char_boundary(end) {
                let original = &rendered[at..end];
                let marked = format!("<mark>{original}</mark>");
                rendered = format!("{}{}{}", &rendered[..at], marked, &rendered[end..]);
            }
        }
    }
    rendered
}

fn escape_html(input: &str) -> String {
    let collapsed = RE_MULTI_WS.replace_all(input.trim(), " ");
    collapsed
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
