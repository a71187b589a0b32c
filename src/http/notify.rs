//! Connection-reuse notification

use std::io::{self, Read};

use super::BodyRead;

/// Wraps a body and signals its owner, exactly once, when the body is done.
///
/// The signal fires on the first end-of-stream read, on `close`, or on drop,
/// whichever comes first. After it fires the connection may carry the next
/// request.
pub struct NotifyingReader<R: BodyRead, F: FnOnce()> {
    inner: R,
    on_consumed: Option<F>,
}

impl<R: BodyRead, F: FnOnce()> NotifyingReader<R, F> {
    pub fn new(inner: R, on_consumed: F) -> Self {
        NotifyingReader {
            inner,
            on_consumed: Some(on_consumed),
        }
    }

    /// Whether the signal has been sent
    pub fn has_notified(&self) -> bool {
        self.on_consumed.is_none()
    }

    fn notify(&mut self) {
        if let Some(signal) = self.on_consumed.take() {
            tracing::trace!("body consumed");
            signal();
        }
    }
}

impl<R: BodyRead, F: FnOnce()> Read for NotifyingReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.notify();
        }
        Ok(n)
    }
}

impl<R: BodyRead, F: FnOnce()> BodyRead for NotifyingReader<R, F> {
    fn close(&mut self) -> io::Result<()> {
        let drained = self.inner.close();
        self.notify();
        drained
    }
}

impl<R: BodyRead, F: FnOnce()> Drop for NotifyingReader<R, F> {
    fn drop(&mut self) {
        if self.on_consumed.is_some() {
            if let Err(err) = self.inner.close() {
                tracing::debug!(error = %err, "draining body on drop failed");
            }
            self.notify();
        }
    }
}
