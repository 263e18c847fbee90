//! Per-session log capture.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;

/// In-memory log of one tracking session.
///
/// The session installs [`subscriber`](Self::subscriber) for its duration and
/// stores [`contents`](Self::contents) in the archive when it finishes. Clones
/// share the same buffer.
#[derive(Debug, Clone)]
pub struct SessionLog {
    buffer: Arc<Mutex<Vec<u8>>>,
    console: bool,
    max_level: LevelFilter,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self {
            buffer: Arc::default(),
            console: true,
            max_level: LevelFilter::INFO,
        }
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also mirror events to stderr (on by default).
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_max_level(mut self, level: LevelFilter) -> Self {
        self.max_level = level;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything captured so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Subscriber writing into this log, plus stderr when enabled.
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        let capture = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(self.clone());
        let console = self
            .console
            .then(|| fmt::layer().with_writer(io::stderr));
        tracing_subscriber::registry()
            .with(self.max_level)
            .with(capture)
            .with(console)
    }
}

/// Writer handed out to the capture layer for each event.
pub struct SessionLogWriter {
    log: SessionLog,
}

impl io::Write for SessionLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SessionLog {
    type Writer = SessionLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SessionLogWriter { log: self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use tracing::{debug, info, warn};

    use super::*;

    #[test]
    fn test_captures_events_in_scope() {
        let log = SessionLog::new().with_console(false);
        tracing::subscriber::with_default(log.subscriber(), || {
            info!(frames = 3, "session started");
            warn!("region rejected");
            debug!("below the default level");
        });
        info!("outside the session");

        let text = log.contents();
        assert!(text.contains("session started"));
        assert!(text.contains("frames=3"));
        assert!(text.contains("region rejected"));
        assert!(!text.contains("below the default level"));
        assert!(!text.contains("outside the session"));
        assert!(!text.contains('\u{1b}'), "capture must not contain ANSI escapes");
    }

    #[test]
    fn test_max_level() {
        let log = SessionLog::new()
            .with_console(false)
            .with_max_level(LevelFilter::DEBUG);
        assert!(log.is_empty());
        tracing::subscriber::with_default(log.subscriber(), || debug!("detail"));
        assert!(log.contents().contains("detail"));
    }
}
