use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::RenderBackend;
use crate::error::RenderError;

/// A render backend plus its one-time initialisation guard.
///
/// Share one handle (in an `Arc`) between everything that may trigger
/// initialisation. Concurrent callers serialize on the lock; only the first
/// successful call initializes, later ones return immediately. A failed
/// initialisation is not retried automatically, the next explicit call tries
/// again.
pub struct BackendHandle {
    backend: Arc<dyn RenderBackend>,
    initialized: Mutex<bool>,
}

impl BackendHandle {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            initialized: Mutex::new(false),
        }
    }

    /// Returns `true` if this call performed the initialisation.
    pub fn ensure_initialized(&self) -> Result<bool, RenderError> {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        if *initialized {
            return Ok(false);
        }
        log::info!("Initializing render backend");
        self.backend.initialize()?;
        *initialized = true;
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }
}
