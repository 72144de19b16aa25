//! Daemon configuration, persisted at `~/.turingmon/config.toml`.

mod loader;

pub use loader::{load_from_path, load_or_default, parse, save_to_path};

use crate::{Error, Result};

pub const CONFIG_DIR_NAME: &str = ".turingmon";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_DEVICE: &str = "auto";
pub const DEFAULT_BAUD: u32 = 115_200;
pub const DEFAULT_BRIGHTNESS: u8 = 50;
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_FULL_REFRESH_MS: u64 = 30_000;
pub const DEFAULT_MERGE_GAP_PX: u16 = 8;
pub const DEFAULT_SERIAL_TIMEOUT_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Serial device path, or "auto" to scan for the panel.
    pub device: String,
    pub baud: u32,
    /// Backlight level, 0..=100.
    pub brightness: u8,
    pub update_interval_ms: u64,
    /// Full-frame resend period; recovers from silently dropped frames.
    pub full_refresh_ms: u64,
    pub merge_gap_px: u16,
    pub serial_timeout_ms: u64,
    /// Layout file; the built-in layout when unset.
    pub layout: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud: DEFAULT_BAUD,
            brightness: DEFAULT_BRIGHTNESS,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            full_refresh_ms: DEFAULT_FULL_REFRESH_MS,
            merge_gap_px: DEFAULT_MERGE_GAP_PX,
            serial_timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
            layout: None,
        }
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.device.is_empty() {
        return Err(Error::Config("device must not be empty".into()));
    }
    if config.baud == 0 {
        return Err(Error::Config("baud must be a positive integer".into()));
    }
    if config.brightness > 100 {
        return Err(Error::Config("brightness must be within 0..=100".into()));
    }
    if config.update_interval_ms < 50 {
        return Err(Error::Config(
            "update_interval_ms must be at least 50".into(),
        ));
    }
    if config.full_refresh_ms < config.update_interval_ms {
        return Err(Error::Config(
            "full_refresh_ms must not be shorter than update_interval_ms".into(),
        ));
    }
    if config.serial_timeout_ms < 100 {
        return Err(Error::Config(
            "serial_timeout_ms must be at least 100".into(),
        ));
    }
    Ok(())
}
