pub mod files;
pub mod settings;

pub use files::{config_file, get_taskin_dir, init_local_taskin};
pub use settings::{load_config, save_config, Config, Presentation};

use anyhow::Result;

/// Resolve the active configuration: config.toml from the taskin directory plus env overrides
pub fn resolve() -> Result<Config> {
    let dir = get_taskin_dir()?;
    let config = load_config(config_file(&dir))?.with_env();
    config.validate()?;
    Ok(config)
}
