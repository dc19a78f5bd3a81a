//! Incremental delivery of generated text with cooperative cancellation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace};

use crate::engine::utils::{lossy, utf8_emit_boundary};

/// Receiver of streamed text.
///
/// Called synchronously on the generating thread with non-empty, valid UTF-8
/// deltas. Returning `false` cancels generation; it is not an error.
pub trait StreamSink {
    fn deliver(&mut self, delta: &str) -> bool;
}

impl<F> StreamSink for F
where
    F: FnMut(&str) -> bool,
{
    fn deliver(&mut self, delta: &str) -> bool {
        self(delta)
    }
}

/// Handle you can keep and flip to cancel a stream (`stop()`).
///
/// Checked only when a delta is about to be delivered; there is no preemption.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Sink adapter that also honours a [`StopHandle`].
pub struct Cancellable<S> {
    inner: S,
    stop: StopHandle,
}

impl<S: StreamSink> Cancellable<S> {
    pub fn new(inner: S, stop: StopHandle) -> Self {
        Self { inner, stop }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: StreamSink> StreamSink for Cancellable<S> {
    fn deliver(&mut self, delta: &str) -> bool {
        if self.stop.is_stopped() {
            return false;
        }
        self.inner.deliver(delta) && !self.stop.is_stopped()
    }
}

/// Tracks how many bytes of the generated text the caller has already seen
/// and pushes only the new, safe slice.
pub struct StreamEmitter<'s> {
    sink: &'s mut dyn StreamSink,
    emitted: usize,
    deltas: usize,
    cancelled: bool,
}

impl<'s> StreamEmitter<'s> {
    pub fn new(sink: &'s mut dyn StreamSink) -> Self {
        Self {
            sink,
            emitted: 0,
            deltas: 0,
            cancelled: false,
        }
    }

    /// Bytes already delivered.
    #[inline]
    pub fn emitted_len(&self) -> usize {
        self.emitted
    }

    /// Number of deltas delivered so far.
    #[inline]
    pub fn deltas(&self) -> usize {
        self.deltas
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Deliver `text[emitted..safe_len]` if non-empty. The boundary is pulled
    /// back before a UTF-8 character that is still incomplete; invalid bytes
    /// go out as U+FFFD.
    ///
    /// Returns `false` once the sink has asked to stop.
    pub fn emit(&mut self, text: &[u8], safe_len: usize) -> bool {
        if self.cancelled {
            return false;
        }
        let safe_len = safe_len.min(text.len());
        let safe_len = utf8_emit_boundary(&text[..safe_len]);
        if safe_len <= self.emitted {
            return true;
        }

        let delta = lossy(&text[self.emitted..safe_len]);
        self.emitted = safe_len;
        self.push(&delta)
    }

    /// Deliver whatever is still buffered, then stop. No-op after cancellation.
    pub fn finish(&mut self, text: &[u8]) {
        if self.cancelled || self.emitted >= text.len() {
            return;
        }
        let delta = lossy(&text[self.emitted..]);
        self.emitted = text.len();
        debug!(bytes = delta.len(), "flushing stream remainder");
        self.push(&delta);
    }

    fn push(&mut self, delta: &str) -> bool {
        if delta.is_empty() {
            return true;
        }
        self.deltas += 1;
        trace!(delta_len = delta.len(), total = self.emitted, "stream delta");
        if !self.sink.deliver(delta) {
            debug!(after_bytes = self.emitted, "stream cancelled by receiver");
            self.cancelled = true;
            return false;
        }
        true
    }
}
