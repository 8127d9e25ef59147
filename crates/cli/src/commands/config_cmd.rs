//! `agentlab config`: show configuration.

use agentlab_config::AppConfig;

pub fn show(path: bool, defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path {
        println!("{}", AppConfig::config_dir().join("config.toml").display());
        return Ok(());
    }
    if defaults {
        println!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.provider.api_key.is_some() {
        config.provider.api_key = Some("***".into());
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
