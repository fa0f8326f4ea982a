//! Background expiry sweep.
//!
//! # Responsibilities
//! - Periodically remove expired entries (firing eviction callbacks)
//! - Stop when the owning cache is dropped
//!
//! # Design Decisions
//! - One named OS thread per cache; the engine API is synchronous
//! - Shutdown is signalled by dropping the stop channel, so the thread never
//!   has to be joined from inside a callback

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::memory::Store;

/// Handle to a running janitor. Dropping it stops the sweep loop.
#[derive(Debug)]
pub(crate) struct Janitor {
    _stop: Sender<()>,
}

impl Janitor {
    pub(crate) fn spawn(store: Arc<Store>, interval: Duration) -> std::io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        thread::Builder::new()
            .name("cache-janitor".to_string())
            .spawn(move || {
                tracing::debug!(interval_ms = interval.as_millis() as u64, "janitor started");
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => store.delete_expired(),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("janitor stopped");
            })?;
        Ok(Self { _stop: stop })
    }
}
