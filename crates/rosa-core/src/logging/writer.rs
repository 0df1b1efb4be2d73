//! Redacting writer factory for the human-readable fmt layer.

use std::io;

use rosa_redact::RedactingWriter;
use tracing_subscriber::fmt::MakeWriter;

/// Wraps another [`MakeWriter`] so every writer it hands out redacts.
///
/// The fmt layer asks for a fresh writer per event and drops it once the
/// event is written; dropping a [`RedactingWriter`] releases anything it
/// still holds, so each event is flushed whole.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl RedactingMakeWriter<fn() -> io::Stderr> {
    /// Redacting writers over stderr.
    pub fn stderr() -> Self {
        RedactingMakeWriter::new(io::stderr as fn() -> io::Stderr)
    }
}

impl<M> RedactingMakeWriter<M> {
    /// Wrap `inner`.
    pub fn new(inner: M) -> Self {
        RedactingMakeWriter { inner }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<'static, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_fmt_layer_output_is_redacted() {
        let buf = SharedBuf::default();
        let make = {
            let buf = buf.clone();
            RedactingMakeWriter::new(move || buf.clone())
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(make)
            .with_ansi(false)
            .without_time();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Running command: rosa login --client-secret abcdef123");
            tracing::warn!(body = r#"{"password":"S3cr3t!"}"#, "request failed");
        });

        let out = buf.contents();
        assert!(!out.contains("abcdef123"), "leaked: {out}");
        assert!(!out.contains("S3cr3t!"), "leaked: {out}");
        assert!(out.contains("--client-secret *************"));
        assert!(out.contains("request failed"));
    }

    #[test]
    fn test_each_writer_releases_on_drop() {
        let buf = SharedBuf::default();
        let make = {
            let buf = buf.clone();
            RedactingMakeWriter::new(move || buf.clone())
        };
        {
            let mut writer = make.make_writer();
            writeln!(writer, "AWS Account:").unwrap();
            assert!(buf.contents().is_empty());
        }
        assert_eq!(buf.contents(), "AWS Account:\n");
    }
}
