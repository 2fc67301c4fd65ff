// src/progress.rs
/// Reporter handed to a cycle by its caller. Frontends implement this to
/// surface status; structured logs go through `tracing` regardless.
pub trait Progress {
    /// Entering a pipeline stage (`"try-direct"`, `"persist"`, ...).
    fn stage(&mut self, _name: &str) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Called once at the end, successful or not.
    fn finish(&mut self, _ok: bool) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
