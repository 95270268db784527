//! Interactive terminal session: setup, the event loop, and key routing.

mod event_loop;
mod keybindings;
mod lifecycle;
mod setup;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::app::App;

pub use event_loop::run_chat;
pub use setup::ChatOptions;

/// Shared handle to the application state used by the event loop.
#[derive(Clone)]
pub struct AppHandle {
    inner: Arc<Mutex<App>>,
}

impl AppHandle {
    pub fn new(app: App) -> Self {
        Self {
            inner: Arc::new(Mutex::new(app)),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&App) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut App) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }
}
