//! Where backend calls run.
//!
//! Settings backends are synchronous and may block (LMDB commits fsync).
//! The dispatcher decides whether such a call runs on the calling task or
//! is moved to tokio's blocking pool.

use prefkit_core::{DispatchMode, PrefsError, PrefsResult};
use tokio::runtime::Handle;
use tracing::warn;

/// Executor for synchronous backend work.
#[derive(Debug, Clone)]
pub enum Dispatcher {
    /// Run on the calling task.
    Inline,
    /// Run on a blocking pool: the given runtime's, or the current one's.
    Background(Option<Handle>),
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::Background(None)
    }
}

impl From<DispatchMode> for Dispatcher {
    fn from(mode: DispatchMode) -> Self {
        match mode {
            DispatchMode::Inline => Dispatcher::Inline,
            DispatchMode::Background => Dispatcher::Background(None),
        }
    }
}

impl Dispatcher {
    /// Background dispatcher pinned to an explicit runtime.
    pub fn on(handle: Handle) -> Self {
        Dispatcher::Background(Some(handle))
    }

    pub fn mode(&self) -> DispatchMode {
        match self {
            Dispatcher::Inline => DispatchMode::Inline,
            Dispatcher::Background(_) => DispatchMode::Background,
        }
    }

    /// Run `f` and wait for its result.
    ///
    /// A background call that panics or is cancelled surfaces as
    /// [`PrefsError::Dispatch`].
    pub async fn run<F, R>(&self, f: F) -> PrefsResult<R>
    where
        F: FnOnce() -> PrefsResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let handle = match self {
            Dispatcher::Inline => return f(),
            Dispatcher::Background(Some(handle)) => handle.spawn_blocking(f),
            Dispatcher::Background(None) => tokio::task::spawn_blocking(f),
        };

        handle.await.map_err(|e| {
            warn!(error = %e, "Background preference call failed");
            PrefsError::Dispatch {
                reason: e.to_string(),
            }
        })?
    }
}
