use std::time::Instant;

use tracing::debug;

use super::AppHandle;

use crate::core::{
    app::{App, AppInitConfig},
    background::BackgroundConfig,
    config::data::Config,
};

/// Command-line overrides for an interactive session.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub server_url: Option<String>,
    pub log: Option<String>,
    pub open: bool,
    pub no_background: bool,
}

/// Merge CLI flags over the persisted config. Flags win.
pub fn resolve_init_config(options: &ChatOptions, config: &Config) -> AppInitConfig {
    let background = (config.background_enabled() && !options.no_background).then(|| {
        let mut background = BackgroundConfig::default();
        if let Some(count) = config.particle_count() {
            background.particle_count = count;
        }
        background
    });

    AppInitConfig {
        server_url: options
            .server_url
            .clone()
            .unwrap_or_else(|| config.server_url().to_string()),
        log_file: options.log.clone(),
        greeting: config.greeting().to_string(),
        typewriter_interval: config.typewriter_interval(),
        background,
    }
}

/// Build the application state for the chat loop.
pub fn bootstrap_app(options: &ChatOptions) -> Result<AppHandle, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let init = resolve_init_config(options, &config);
    debug!(server_url = %init.server_url, background = init.background.is_some(), "bootstrapping");

    let app = App::new(init, Instant::now())?;
    Ok(AppHandle::new(app))
}
