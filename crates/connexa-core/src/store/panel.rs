// ── Reactive dashboard panel ──
//
// One resource's last good data plus its last failure, published through
// a `watch` channel. A failure never replaces data: the panel keeps its
// previous content and carries the error alongside it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Point-in-time view of a panel.
#[derive(Debug)]
pub struct PanelState<T> {
    /// Last successfully loaded data, `None` until the first success.
    pub data: Option<Arc<T>>,
    /// Message of the most recent failed load, cleared by the next success.
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Manual impls: `Arc<T>` is cloneable whatever `T` is.
impl<T> Clone for PanelState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
        }
    }
}

/// A single dashboard region.
pub struct Panel<T> {
    tx: watch::Sender<PanelState<T>>,
}

impl<T> std::fmt::Debug for Panel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.tx.borrow();
        f.debug_struct("Panel")
            .field("loaded", &state.data.is_some())
            .field("error", &state.error)
            .finish()
    }
}

impl<T> Default for Panel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Panel<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PanelState::default());
        Self { tx }
    }

    /// Current state (cheap: data is reference-counted).
    pub fn snapshot(&self) -> PanelState<T> {
        self.tx.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.tx.borrow().data.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.tx.borrow().error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState<T>> {
        self.tx.subscribe()
    }

    /// Replace the data and clear any error.
    pub(crate) fn set(&self, data: T) {
        self.tx.send_modify(|state| {
            state.data = Some(Arc::new(data));
            state.error = None;
            state.updated_at = Some(Utc::now());
        });
    }

    /// Record a failure, keeping the previous data.
    pub(crate) fn fail(&self, message: String) {
        self.tx.send_modify(|state| state.error = Some(message));
    }

    /// Forget everything (logout).
    pub(crate) fn clear(&self) {
        self.tx.send_replace(PanelState::default());
    }
}
