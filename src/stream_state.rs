//! Explicit state machine for consuming a streamed completion: fragments
//! append in arrival order, terminal states are final, and cancellation stops
//! fragment delivery. The SSE forwarding loops drive one of these per
//! response; the assembled text and the in-progress flag are what a rendering
//! surface polls.

/// Lifecycle of one streamed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Created, no fragment received yet.
    Idle,
    /// At least one fragment received, more may follow.
    Streaming,
    /// Upstream finished normally; the text is complete.
    Complete,
    /// Upstream failed; partial text may remain.
    Errored,
    /// The consumer was cancelled (e.g. the client disconnected); further
    /// fragments are dropped.
    Cancelled,
}

/// Accumulates a streamed response fragment by fragment.
#[derive(Debug)]
pub struct StreamConsumer {
    phase: StreamPhase,
    text: String,
    error: Option<String>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            phase: StreamPhase::Idle,
            text: String::new(),
            error: None,
        }
    }

    /// Append a fragment. Enters `Streaming` from `Idle`; fragments arriving
    /// after a terminal state are dropped.
    pub fn push(&mut self, fragment: &str) {
        match self.phase {
            StreamPhase::Idle | StreamPhase::Streaming => {
                self.phase = StreamPhase::Streaming;
                self.text.push_str(fragment);
            }
            StreamPhase::Complete | StreamPhase::Errored | StreamPhase::Cancelled => {}
        }
    }

    /// Upstream ended normally. A no-op once terminal.
    pub fn finish(&mut self) {
        if self.is_in_progress() {
            self.phase = StreamPhase::Complete;
        }
    }

    /// Upstream failed. A no-op once terminal.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_in_progress() {
            self.phase = StreamPhase::Errored;
            self.error = Some(message.into());
        }
    }

    /// Stop fragment delivery and settle in the terminal cancelled state.
    pub fn cancel(&mut self) {
        if self.is_in_progress() {
            self.phase = StreamPhase::Cancelled;
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// True while more fragments may still arrive.
    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, StreamPhase::Idle | StreamPhase::Streaming)
    }

    /// Everything received so far, in arrival order.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamConsumer {
    /// A consumer dropped mid-stream means the client went away: transition
    /// to cancelled so the abandonment is observable in logs.
    fn drop(&mut self) {
        if self.is_in_progress() && self.phase == StreamPhase::Streaming {
            self.cancel();
            tracing::debug!(
                received = self.text.len(),
                "completion stream cancelled before finishing"
            );
        }
    }
}
