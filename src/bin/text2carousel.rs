//! CLI binary for text2carousel.
//!
//! A thin shim over the library crate: build generation prompts, validate
//! saved model responses, and package pre-rendered slide images into a zip
//! archive or PDF through the real assembly pipeline.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use text2carousel::{
    build_carousel_prompt, flatten_post, render_slides_to_pdf, render_slides_to_zip,
    GenerationRequest, RenderCallError, RenderOptions, RenderPreset, SlideMarkup, SlideRenderer,
    StructuredPostOutput, Viewport,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the generation prompt for a text file
  text2carousel prompt notes.txt --max-slides 10 --tone "playful"

  # Validate a saved raw model response
  text2carousel validate response.txt -o post.json

  # Validate and print the flat preview shape
  text2carousel validate response.txt --flat

  # Package pre-rendered slides (slide-01.png, slide-02.png, …) as a zip
  text2carousel package post.json --images-dir renders/ -o slides.zip

  # Package as a LinkedIn-sized PDF
  text2carousel package post.json --images-dir renders/ --format pdf \
      --preset linkedin -o slides-1200x1500.pdf

EXIT CODES:
  0  success
  1  validation or packaging failed (classified error printed to stderr)
  2  usage error
"#;

/// Generate, validate, and package carousel posts.
#[derive(Parser, Debug)]
#[command(
    name = "text2carousel",
    version,
    about = "Turn extracted document text into validated, rendered carousel posts",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TEXT2CAROUSEL_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and print the generation prompt for an input text.
    Prompt {
        /// Input text file, or '-' for stdin.
        input: String,

        /// Slide-count ceiling (clamped to 1-10).
        #[arg(long, default_value_t = 10)]
        max_slides: usize,

        /// Tone embedded in the prompt.
        #[arg(long, default_value = "")]
        tone: String,

        /// Branding footer sentence appended to the caption rule.
        #[arg(long)]
        branding_footer: Option<String>,
    },

    /// Validate a saved raw model response into a structured post.
    Validate {
        /// File holding the raw model response, or '-' for stdin.
        input: String,

        /// Slide-count ceiling used for validation (clamped to 1-10).
        #[arg(long, default_value_t = 10)]
        max_slides: usize,

        /// Write the validated post JSON here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the flat headline/content preview shape instead.
        #[arg(long)]
        flat: bool,
    },

    /// Package pre-rendered slide images through the assembly pipeline.
    Package {
        /// Validated post JSON (as produced by `validate`).
        post: PathBuf,

        /// Directory holding slide-01.png, slide-02.png, …
        #[arg(long)]
        images_dir: PathBuf,

        /// Output artifact: zip or pdf.
        #[arg(long, value_enum, default_value = "zip")]
        format: ArtifactFormat,

        /// Output size preset.
        #[arg(long, value_enum, default_value = "square")]
        preset: PresetArg,

        /// Concurrent render (file-load) calls.
        #[arg(short, long, default_value_t = 2)]
        concurrency: usize,

        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,

        /// Disable the progress bar.
        #[arg(long)]
        no_progress: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ArtifactFormat {
    Zip,
    Pdf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Square,
    Linkedin,
}

impl From<PresetArg> for RenderPreset {
    fn from(v: PresetArg) -> Self {
        match v {
            PresetArg::Square => RenderPreset::Square,
            PresetArg::Linkedin => RenderPreset::LinkedIn,
        }
    }
}

// ── Directory-backed renderer ────────────────────────────────────────────────

static RE_SLIDE_BADGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class="slide-number">(\d+) / \d+<"#).unwrap());

/// A [`SlideRenderer`] that serves pre-rendered images from a directory.
///
/// The slide position is recovered from the markup's slide-number badge, so
/// the assembler's ordering guarantees are exercised exactly as they would
/// be with a live renderer.
struct DirRenderer {
    dir: PathBuf,
    progress: Option<ProgressBar>,
}

#[async_trait]
impl SlideRenderer for DirRenderer {
    async fn render(
        &self,
        markup: &SlideMarkup,
        _viewport: Viewport,
    ) -> Result<Vec<u8>, RenderCallError> {
        let position: usize = RE_SLIDE_BADGE
            .captures(&markup.html)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(|| RenderCallError::new("markup carries no slide-number badge"))?;

        let path = self.dir.join(format!("slide-{position:02}.png"));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| RenderCallError::new(format!("{}: {e}", path.display())))?;

        if let Some(ref bar) = self.progress {
            bar.inc(1);
        }
        Ok(bytes)
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos}/{len} slides",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.set_prefix("Packaging");
    bar
}

// ── IO helpers ───────────────────────────────────────────────────────────────

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read '{input}'"))
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(contents.as_bytes())
                .context("Failed to write to stdout")?;
            if !contents.ends_with('\n') {
                handle.write_all(b"\n").context("Failed to write to stdout")?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Prompt {
            input,
            max_slides,
            tone,
            branding_footer,
        } => {
            let text = read_input(&input)?;
            let mut request = GenerationRequest::new(text, max_slides).with_tone(tone);
            if let Some(footer) = branding_footer {
                request = request.with_branding_footer(footer);
            }
            println!("{}", build_carousel_prompt(&request));
        }

        Command::Validate {
            input,
            max_slides,
            output,
            flat,
        } => {
            let raw = read_input(&input)?;
            let ceiling = max_slides.clamp(1, 10);
            match text2carousel::validate_model_response(&raw, ceiling) {
                Ok(post) => {
                    let json = if flat {
                        serde_json::to_string_pretty(&flatten_post(&post))
                    } else {
                        serde_json::to_string_pretty(&post)
                    }
                    .context("Failed to serialize post")?;
                    write_output(output.as_deref(), &json)?;
                }
                Err(err) => {
                    eprintln!("{} {} ({})", red("✗"), err, bold(err.code()));
                    std::process::exit(1);
                }
            }
        }

        Command::Package {
            post,
            images_dir,
            format,
            preset,
            concurrency,
            output,
            no_progress,
        } => {
            let post: StructuredPostOutput = serde_json::from_str(
                &std::fs::read_to_string(&post)
                    .with_context(|| format!("Failed to read '{}'", post.display()))?,
            )
            .context("Post file is not a valid structured post")?;

            if !images_dir.is_dir() {
                bail!("--images-dir '{}' is not a directory", images_dir.display());
            }

            let bar = (!no_progress).then(|| progress_bar(post.slides.len()));
            let renderer = Arc::new(DirRenderer {
                dir: images_dir,
                progress: bar.clone(),
            });
            let options = RenderOptions::builder()
                .preset(preset.into())
                .concurrency(concurrency)
                .build()
                .context("Invalid render options")?;

            let bytes = match format {
                ArtifactFormat::Zip => {
                    render_slides_to_zip(&post.slides, &post.theme, renderer, &options).await
                }
                ArtifactFormat::Pdf => {
                    render_slides_to_pdf(&post.slides, &post.theme, renderer, &options).await
                }
            }
            .context("Packaging failed")?;

            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write '{}'", output.display()))?;
            eprintln!(
                "{} {} slides → {} ({} bytes)",
                green("✔"),
                post.slides.len(),
                bold(&output.display().to_string()),
                bytes.len()
            );
        }
    }

    Ok(())
}
