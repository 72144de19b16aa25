use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

use super::{Config, CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// Load the user config, writing a default file on first run.
pub fn load_or_default() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        save_to_path(&cfg, &path)?;
        super::validate(&cfg)?;
        return Ok(cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        super::validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(path)?;
    parse(&raw)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = format!(
        "# turingmon config\n\
device = \"{}\"\n\
baud = {}\n\
brightness = {}\n\
update_interval_ms = {}\n\
full_refresh_ms = {}\n\
merge_gap_px = {}\n\
serial_timeout_ms = {}\n\
layout = {}\n",
        config.device,
        config.baud,
        config.brightness,
        config.update_interval_ms,
        config.full_refresh_ms,
        config.merge_gap_px,
        config.serial_timeout_ms,
        config
            .layout
            .as_ref()
            .map(|p| format!("\"{p}\""))
            .unwrap_or_else(|| "null".into()),
    );
    fs::write(path, contents)?;
    Ok(())
}

pub fn parse(raw: &str) -> Result<Config> {
    let mut cfg = Config::default();

    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, value) = trimmed.split_once('=').ok_or_else(|| {
            Error::Config(format!("invalid config line {}: '{}'", idx + 1, line))
        })?;

        let key = key.trim();
        let value = value.trim().trim_matches('"');
        match key {
            "device" => cfg.device = value.to_string(),
            "baud" => {
                cfg.baud = value.parse().map_err(|_| {
                    Error::Config(format!("invalid baud value on line {}", idx + 1))
                })?;
            }
            "brightness" => {
                cfg.brightness = value.parse().map_err(|_| {
                    Error::Config(format!("invalid brightness on line {}", idx + 1))
                })?;
            }
            "update_interval_ms" => {
                cfg.update_interval_ms = value.parse().map_err(|_| {
                    Error::Config(format!("invalid update_interval_ms on line {}", idx + 1))
                })?;
            }
            "full_refresh_ms" => {
                cfg.full_refresh_ms = value.parse().map_err(|_| {
                    Error::Config(format!("invalid full_refresh_ms on line {}", idx + 1))
                })?;
            }
            "merge_gap_px" => {
                cfg.merge_gap_px = value.parse().map_err(|_| {
                    Error::Config(format!("invalid merge_gap_px on line {}", idx + 1))
                })?;
            }
            "serial_timeout_ms" => {
                cfg.serial_timeout_ms = value.parse().map_err(|_| {
                    Error::Config(format!("invalid serial_timeout_ms on line {}", idx + 1))
                })?;
            }
            "layout" => {
                cfg.layout = if value == "null" {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown config key '{}' on line {}",
                    other,
                    idx + 1
                )));
            }
        }
    }

    super::validate(&cfg)?;
    Ok(cfg)
}

fn config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config("HOME not set; cannot locate config directory".into()))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
