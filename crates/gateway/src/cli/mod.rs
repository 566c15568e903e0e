pub mod config;

use clap::{Parser, Subcommand};

use es_domain::config::Config;

/// EduSync: school notification and guardian chat backend.
#[derive(Debug, Parser)]
#[command(name = "edusync", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "EDUSYNC_CONFIG";

/// Load the configuration from the path specified by `EDUSYNC_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.  A missing file yields the defaults.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.dispatch.chunk_size, 50);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch]\nchunk_size = 20").unwrap();
        let config = load_config_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.dispatch.chunk_size, 20);
        assert_eq!(config.dispatch.inter_chunk_delay_ms, 1000);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch\nchunk_size = ").unwrap();
        let path = file.path().to_str().unwrap().to_owned();
        let err = load_config_from(&path).unwrap_err().to_string();
        assert!(err.contains(&path), "{err}");
    }
}
