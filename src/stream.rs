//! Streaming archive assembly: emit zip bytes as slides finish rendering.
//!
//! ## Why stream?
//!
//! Rendering ten slides through a two-wide pool takes seconds. A streaming
//! API lets the caller start sending archive bytes downstream before the
//! last slide finishes, instead of buffering the whole artifact.
//!
//! ## Ordering
//!
//! Render *submission* order equals slide order, but completion order is
//! whatever the pool produces. The archive's entries must still appear as
//! `slide-01.png`, `slide-02.png`, … in slide order, so completed renders
//! land in a reorder buffer keyed by original index. After each completion
//! the sink drains every contiguous run starting at the next expected index,
//! appends those entries to the archive, and advances the cursor; a gap
//! leaves later results buffered until the missing render arrives. The
//! buffer and cursor are owned by [`OrderedArchiveSink`] and touched only
//! under its mutex (the serialized "append chain"), never by worker bodies
//! directly.
//!
//! ## Incremental byte emission
//!
//! The zip writer seeks back to patch an entry's local header when the next
//! entry starts, so a written byte is only final once the *following*
//! `start_file` call lands. The sink tracks exactly that boundary and
//! forwards each newly finalized region to the output channel, with the
//! remainder flushed after `finish()`.

use crate::config::RenderOptions;
use crate::error::AssemblyError;
use crate::pipeline::markup::{build_slide_markup, SlideMarkup};
use crate::pipeline::pool;
use crate::pipeline::render::{render_slide, SlideRenderer};
use crate::post::{PostTheme, StructuredSlide};
use std::collections::HashMap;
use std::io::{self, Seek, SeekFrom, Write};
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};
use zip::write::{FileOptions, ZipWriter};

/// A boxed stream of archive byte chunks.
pub type ArchiveByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, AssemblyError>> + Send>>;

/// Zero-padded archive entry name for a 0-based slide index.
fn entry_name(index: usize) -> String {
    format!("slide-{:02}.png", index + 1)
}

/// Render all slides and stream the resulting zip archive.
///
/// Markup for every slide is built up front so structural render errors
/// surface before any bytes flow. Rendering then fans out through the
/// bounded pool at `options.concurrency`; a render failure aborts the batch
/// and surfaces as the final stream item.
pub fn render_slides_to_zip_stream(
    slides: Vec<StructuredSlide>,
    theme: PostTheme,
    renderer: Arc<dyn SlideRenderer>,
    options: RenderOptions,
) -> Result<ArchiveByteStream, AssemblyError> {
    if slides.is_empty() {
        return Err(AssemblyError::NoSlides);
    }

    let total = slides.len();
    let markups: Vec<SlideMarkup> = slides
        .iter()
        .enumerate()
        .map(|(index, slide)| build_slide_markup(slide, &theme, options.preset, index, total))
        .collect::<Result<_, _>>()?;

    let viewport = options.preset.viewport();
    let concurrency = options.concurrency;
    let (tx, rx) = mpsc::channel::<Result<Vec<u8>, AssemblyError>>(16);

    tokio::spawn(async move {
        info!(slides = total, concurrency, "starting archive assembly");
        let sink = Mutex::new(OrderedArchiveSink::new(tx.clone()));

        let outcome = pool::run_limited(markups, concurrency, |index, markup| {
            let renderer = Arc::clone(&renderer);
            let sink = &sink;
            async move {
                let png = render_slide(renderer.as_ref(), index, &markup, viewport).await?;
                sink.lock().await.submit(index, png).await
            }
        })
        .await;

        match outcome {
            Ok(_) => {
                if let Err(err) = sink.into_inner().finish().await {
                    warn!(%err, "archive finalization failed");
                    let _ = tx.send(Err(err)).await;
                } else {
                    info!(slides = total, "archive complete");
                }
            }
            Err(err) => {
                warn!(%err, "batch render failed, aborting archive");
                let _ = tx.send(Err(err)).await;
            }
        }
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}

/// Render all slides and collect the zip archive into one buffer.
pub async fn render_slides_to_zip(
    slides: &[StructuredSlide],
    theme: &PostTheme,
    renderer: Arc<dyn SlideRenderer>,
    options: &RenderOptions,
) -> Result<Vec<u8>, AssemblyError> {
    let mut stream =
        render_slides_to_zip_stream(slides.to_vec(), theme.clone(), renderer, options.clone())?;
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}

// ── Reorder buffer + serialized append chain ─────────────────────────────

/// The reorder buffer and its append cursor.
///
/// Owned exclusively by the assembly task; workers reach it only through a
/// mutex, so inserts and drains are serialized relative to each other even
/// though renders run concurrently.
struct OrderedArchiveSink {
    writer: ZipWriter<SharedCursor>,
    reader: SharedCursor,
    pending: HashMap<usize, Vec<u8>>,
    next_index: usize,
    emitted: usize,
    tx: mpsc::Sender<Result<Vec<u8>, AssemblyError>>,
}

impl OrderedArchiveSink {
    fn new(tx: mpsc::Sender<Result<Vec<u8>, AssemblyError>>) -> Self {
        let cursor = SharedCursor::new();
        let reader = cursor.clone();
        Self {
            writer: ZipWriter::new(cursor),
            reader,
            pending: HashMap::new(),
            next_index: 0,
            emitted: 0,
            tx,
        }
    }

    /// Buffer one completed render, then drain every contiguous run ready
    /// at the next expected index.
    async fn submit(&mut self, index: usize, png: Vec<u8>) -> Result<(), AssemblyError> {
        self.pending.insert(index, png);
        while let Some(png) = self.pending.remove(&self.next_index) {
            // Bytes written before this entry's local header become final
            // when start_file patches the previous entry's header.
            let stable = self.reader.len();
            let options: FileOptions<()> = FileOptions::default();
            self.writer
                .start_file(entry_name(self.next_index), options)
                .map_err(|e| AssemblyError::Archive(e.to_string()))?;
            self.emit_up_to(stable).await?;
            self.writer
                .write_all(&png)
                .map_err(|e| AssemblyError::Archive(e.to_string()))?;
            self.next_index += 1;
        }
        Ok(())
    }

    /// Close the archive and flush the remaining bytes.
    async fn finish(self) -> Result<(), AssemblyError> {
        let Self {
            writer,
            emitted,
            tx,
            pending,
            ..
        } = self;
        debug_assert!(pending.is_empty(), "finish called with renders still buffered");

        let cursor = writer
            .finish()
            .map_err(|e| AssemblyError::Archive(e.to_string()))?;
        let end = cursor.len();
        if end > emitted {
            let chunk = cursor.copy_range(emitted, end);
            tx.send(Ok(chunk))
                .await
                .map_err(|_| AssemblyError::Archive("archive consumer dropped".into()))?;
        }
        Ok(())
    }

    async fn emit_up_to(&mut self, stable: usize) -> Result<(), AssemblyError> {
        if stable > self.emitted {
            let chunk = self.reader.copy_range(self.emitted, stable);
            self.emitted = stable;
            self.tx
                .send(Ok(chunk))
                .await
                .map_err(|_| AssemblyError::Archive("archive consumer dropped".into()))?;
        }
        Ok(())
    }
}

// ── Shared in-memory cursor ──────────────────────────────────────────────

/// A `Write + Seek` buffer whose contents stay readable from a second
/// handle while the zip writer owns the first.
///
/// The zip writer needs `Seek` to patch local headers; the sink needs to
/// read finalized regions to forward them downstream. Sharing the byte
/// vector behind an `Arc` gives both without copying the archive twice.
#[derive(Clone)]
struct SharedCursor {
    buf: Arc<StdMutex<Vec<u8>>>,
    pos: u64,
}

impl SharedCursor {
    fn new() -> Self {
        Self {
            buf: Arc::new(StdMutex::new(Vec::new())),
            pos: 0,
        }
    }

    fn len(&self) -> usize {
        self.lock_buf().len()
    }

    fn copy_range(&self, from: usize, to: usize) -> Vec<u8> {
        self.lock_buf()[from..to].to_vec()
    }

    fn lock_buf(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SharedCursor {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.lock_buf();
        let pos = self.pos as usize;
        if pos > buf.len() {
            buf.resize(pos, 0);
        }
        let overlap = (buf.len() - pos).min(data.len());
        buf[pos..pos + overlap].copy_from_slice(&data[..overlap]);
        buf.extend_from_slice(&data[overlap..]);
        drop(buf);
        self.pos += data.len() as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let end = self.len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(offset) => end + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of archive buffer",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}
