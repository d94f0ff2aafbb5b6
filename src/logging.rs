// Logging setup: a fmt subscriber on stderr so stdout stays free for the
// values commands print (such as the uploaded package path). Spinners share
// stderr, so every log line is written with the progress display suspended.

use indicatif::MultiProgress;
use std::io::{self, Write};
use std::mem;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Progress display every spinner is attached to.
pub fn progress() -> &'static MultiProgress {
    static PROGRESS: OnceLock<MultiProgress> = OnceLock::new();
    PROGRESS.get_or_init(MultiProgress::new)
}

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(SuspendingWriter::new(progress().clone(), io::stderr))
        .with_target(false)
        .init();
}

/// Wraps a writer factory so each event is buffered and flushed to the
/// inner writer in one piece while `progress` is suspended.
pub struct SuspendingWriter<W> {
    progress: MultiProgress,
    inner: W,
}

impl<W> SuspendingWriter<W> {
    pub fn new(progress: MultiProgress, inner: W) -> Self {
        Self { progress, inner }
    }
}

impl<'a, W: MakeWriter<'a> + 'a> MakeWriter<'a> for SuspendingWriter<W> {
    type Writer = SuspendedLine<'a, W>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendedLine {
            progress: &self.progress,
            inner: &self.inner,
            buf: Vec::new(),
        }
    }
}

/// One event's worth of output; the inner writer is only opened on drop.
pub struct SuspendedLine<'a, W: MakeWriter<'a>> {
    progress: &'a MultiProgress,
    inner: &'a W,
    buf: Vec<u8>,
}

impl<'a, W: MakeWriter<'a>> Write for SuspendedLine<'a, W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a, W: MakeWriter<'a>> Drop for SuspendedLine<'a, W> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let buf = mem::take(&mut self.buf);
        let mut inner = self.inner.make_writer();
        self.progress.suspend(|| {
            let _ = inner.write_all(&buf);
            let _ = inner.flush();
        });
    }
}
