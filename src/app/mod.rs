//! Daemon wiring: merged configuration, startup, and shutdown.

mod demo;
mod lifecycle;
mod logger;
mod scheduler;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cli::RunOptions;
use crate::config::{self, Config};
use crate::layout::Layout;
use crate::metrics::{MetricsSource, SystemMetrics};
use crate::render::{Compositor, RenderOptions};
use crate::transport::{SerialOptions, Transport};
use crate::Result;

use demo::run_demo;
pub use logger::{LogLevel, Logger};
pub use scheduler::Scheduler;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Config for the daemon, config file merged with CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub device: String,
    pub baud: u32,
    pub brightness: u8,
    pub update_interval_ms: u64,
    pub full_refresh_ms: u64,
    pub merge_gap_px: u16,
    pub serial_timeout_ms: u64,
    pub layout: Option<String>,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub test_render: bool,
    pub demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_sources(Config::default(), RunOptions::default())
    }
}

impl AppConfig {
    pub fn from_sources(config: Config, opts: RunOptions) -> Self {
        Self {
            device: opts.device.unwrap_or(config.device),
            baud: opts.baud.unwrap_or(config.baud),
            brightness: opts.brightness.unwrap_or(config.brightness),
            update_interval_ms: opts.interval_ms.unwrap_or(config.update_interval_ms),
            full_refresh_ms: config.full_refresh_ms,
            merge_gap_px: config.merge_gap_px,
            serial_timeout_ms: config.serial_timeout_ms,
            layout: opts.layout.or(config.layout),
            log_level: opts
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s).ok())
                .unwrap_or_default(),
            log_file: opts.log_file,
            test_render: opts.test_render,
            demo: opts.demo,
        }
    }

    pub fn serial_options(&self) -> SerialOptions {
        SerialOptions {
            baud: self.baud,
            timeout: Duration::from_millis(self.serial_timeout_ms),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            full_refresh: Duration::from_millis(self.full_refresh_ms),
            merge_gap: self.merge_gap_px,
        }
    }
}

pub struct App {
    config: AppConfig,
    logger: Arc<Logger>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let logger = Arc::new(Logger::new(config.log_level, config.log_file.clone()));
        Self { config, logger }
    }

    pub fn from_options(opts: RunOptions) -> Result<Self> {
        let cfg_file = config::load_or_default()?;
        Ok(Self::new(AppConfig::from_sources(cfg_file, opts)))
    }

    /// Entry point for the daemon.
    pub fn run(&self) -> Result<()> {
        let config = &self.config;

        let (layout, base_dir) = load_layout(config.layout.as_deref())?;
        self.logger.info(format!(
            "layout '{}' with {} widget(s)",
            layout.name,
            layout.widgets.len()
        ));

        let compositor = Compositor::new(&layout, config.render_options(), &base_dir);
        for (id, err) in compositor.rejected() {
            self.logger.warn(format!("skipping widget '{id}': {err}"));
        }

        if config.test_render {
            return self.run_test_render(compositor);
        }

        let transport = Arc::new(Transport::new());
        transport.connect(&config.device, config.serial_options())?;
        transport.init_display(config.brightness)?;
        self.logger.info(format!(
            "panel up (device={}, baud={}, brightness={})",
            config.device, config.baud, config.brightness
        ));

        let running = lifecycle::create_shutdown_flag()?;

        if config.demo {
            self.logger.info("demo mode: cycling solid fills");
            let result = run_demo(&transport, &self.logger, &running);
            transport.disconnect();
            return result;
        }

        let scheduler = Scheduler::spawn(
            compositor,
            SystemMetrics::new(),
            transport.clone(),
            self.logger.clone(),
            Duration::from_millis(config.update_interval_ms),
            running.clone(),
        );

        while running.load(Ordering::SeqCst) && !scheduler.is_finished() {
            thread::sleep(Duration::from_millis(50));
        }

        if !scheduler.stop(STOP_TIMEOUT) {
            self.logger
                .warn("cycle thread still busy past the stop deadline");
        }
        transport.disconnect();
        self.logger.info("daemon exiting");
        Ok(())
    }

    /// One compositor cycle against live metrics, no device attached.
    fn run_test_render(&self, mut compositor: Compositor) -> Result<()> {
        let mut source = SystemMetrics::new();
        let snapshot = source.sample();
        let regions = compositor.run_cycle(&snapshot, Instant::now())?;
        for region in &regions {
            println!(
                "region {}x{} at ({},{}), {} payload bytes",
                region.width,
                region.height,
                region.x,
                region.y,
                region.pixels.len()
            );
        }
        Ok(())
    }
}

fn load_layout(path: Option<&str>) -> Result<(Layout, PathBuf)> {
    match path {
        Some(path) => {
            let layout = Layout::load(Path::new(path))?;
            let base = Path::new(path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf();
            Ok((layout, base))
        }
        None => Ok((Layout::minimal(), PathBuf::from("."))),
    }
}
