use thiserror::Error;

/// A boxed error that can be sent across threads.
///
/// This is the standard error type used throughout async Rust ecosystems
/// (tokio, tower, axum, etc.). Any error implementing `std::error::Error`
/// can be automatically converted to this type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The lifecycle transition a hook guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Before the first job execution of a freshly started loop.
    Start,
    /// Before the cancellation signal is delivered to the loop.
    Stop,
    /// Between a completed stop and the restart that follows it.
    Reset,
    /// After the shutdown sequence's final maintenance pass.
    PostStop,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookPhase::Start => "pre-start",
            HookPhase::Stop => "pre-cancellation",
            HookPhase::Reset => "reset",
            HookPhase::PostStop => "post-stop",
        };
        f.write_str(name)
    }
}

/// Error type for worker lifecycle operations.
///
/// Job and maintenance failures never surface here: they are reported via
/// `tracing` and handled inside the loop (see the crate docs). The only
/// caller-visible failure mode is hook code, which aborts the transition
/// it guards.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A lifecycle hook failed, aborting the enclosing transition.
    #[error("{phase} hook failed")]
    Hook {
        phase: HookPhase,
        #[source]
        source: BoxError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
