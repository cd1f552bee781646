//! Ordered, append-only feed of human-readable progress and error lines.
//!
//! The sink is the sole failure-reporting channel to the operator: every
//! attempted action contributes at least one line. It is passed into the
//! session explicitly; there is no global state. A presentation layer can
//! either subscribe for live lines or snapshot the accumulated feed.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<SinkInner>>,
}

struct SinkInner {
    entries: Vec<String>,
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkInner {
                entries: Vec::new(),
                tx: None,
            })),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        let line = message.into();
        log::info!("{line}");
        self.push(line);
    }

    pub fn error(&self, message: impl Into<String>) {
        let line = format!("ERROR: {}", message.into());
        log::error!("{line}");
        self.push(line);
    }

    fn push(&self, line: String) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(tx) = &inner.tx {
            // A gone receiver just means nobody is watching live.
            let _ = tx.send(line.clone());
        }
        inner.entries.push(line);
    }

    /// Snapshot of every line appended so far, in order.
    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().unwrap().entries.clone()
    }

    /// Receive lines live as they are appended. The channel closes when the
    /// last clone of this sink is dropped.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().tx = Some(tx);
        rx
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_append_order() {
        let sink = LogSink::new();
        sink.info("first");
        sink.error("second");
        sink.info("third");

        assert_eq!(
            sink.entries(),
            vec!["first", "ERROR: second", "third"]
        );
    }

    #[tokio::test]
    async fn subscriber_receives_lines_live() {
        let sink = LogSink::new();
        let mut rx = sink.subscribe();

        sink.info("hello");
        assert_eq!(rx.recv().await.unwrap(), "hello");

        sink.error("bad");
        assert_eq!(rx.recv().await.unwrap(), "ERROR: bad");

        drop(sink);
        assert!(rx.recv().await.is_none());
    }
}
