//! Progress reporting seam.
//!
//! The core has no I/O; an embedding tool that wants a progress bar plugs in
//! here. The default recorder does nothing, and the core never depends on a
//! recorder doing anything.

// ---------------------------------------------------------------------------
// ProgressRecorder
// ---------------------------------------------------------------------------

/// Callback surface for long-running phases.
///
/// A session brackets one phase: `new_session` announces a label and an upper
/// bound, `up_to` reports monotonic progress toward it, `close` ends the
/// session. Sessions never nest.
pub trait ProgressRecorder {
    fn new_session(&mut self, label: &str, maximum: usize);
    fn up_to(&mut self, progress: usize);
    fn close(&mut self);
}

/// The no-op recorder.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressRecorder for NoProgress {
    fn new_session(&mut self, _label: &str, _maximum: usize) {}

    fn up_to(&mut self, _progress: usize) {}

    fn close(&mut self) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
