//! Shared constants used across the application

use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

pub const WELCOME_MESSAGE: &str =
    "Welcome to WE AI Agriculture Assistant. How can I help you today?";

/// Shown once when a session cannot be created or its socket cannot connect.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Press Ctrl+L to reconnect.";

pub const TYPING_INDICATOR: &str = "...";

pub const DEFAULT_TYPEWRITER_INTERVAL_MS: u64 = 20;

/// Startup grace period before the greeting is added to an empty transcript.
pub const WELCOME_DELAY: Duration = Duration::from_millis(1000);

pub const MAX_FPS: u64 = 60;
