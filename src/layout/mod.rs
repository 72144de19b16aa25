//! Widget layout descriptors, loaded from a JSON file.
//!
//! The layout names the display background and an ordered list of widget
//! specifications. Descriptor problems (unknown fields, bad colors,
//! out-of-bounds placement) surface as `Error::Config` when widgets are
//! built; a bad widget is skipped, never clamped.

use std::path::Path;

use embedded_graphics::pixelcolor::Rgb888;
use serde::Deserialize;

use crate::{Error, Result, DISPLAY_HEIGHT, DISPLAY_WIDTH};

#[derive(Debug, Clone, Deserialize)]
pub struct Layout {
    #[serde(default = "default_layout_name")]
    pub name: String,
    #[serde(default)]
    pub display: DisplaySpec,
    #[serde(default)]
    pub widgets: Vec<WidgetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySpec {
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
    #[serde(default = "default_background")]
    pub background_color: String,
}

impl Default for DisplaySpec {
    fn default() -> Self {
        Self {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            background_color: default_background(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Text,
    ProgressBar,
    Gauge,
    Image,
    Sparkline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

/// One widget descriptor. Style fields are optional and interpreted by the
/// widget kind that uses them; the rest ignore them.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetSpec {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub id: String,
    pub position: Position,
    pub size: Dimensions,
    #[serde(default = "default_data_source")]
    pub data_source: String,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    // Shared styling.
    pub label: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    #[serde(default)]
    pub align: Align,
    pub font_size: Option<u16>,

    // Progress bar / gauge.
    pub bar_color: Option<String>,
    #[serde(default = "default_true")]
    pub show_value: bool,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,

    // Sparkline.
    pub line_color: Option<String>,
    pub fill_color: Option<String>,
    #[serde(default = "default_num_points")]
    pub num_points: usize,

    // Image.
    pub path: Option<String>,
}

impl Layout {
    /// Load a layout file. Callers fall back to [`Layout::minimal`] when the
    /// file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("cannot read layout {}: {err}", path.display()))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let layout: Layout = serde_json::from_str(raw)
            .map_err(|err| Error::Config(format!("invalid layout json: {err}")))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Built-in fallback layout: a centered clock.
    pub fn minimal() -> Self {
        Self::parse(
            r##"{
                "name": "Built-in minimal",
                "widgets": [
                    {
                        "type": "text",
                        "id": "clock",
                        "position": {"x": 10, "y": 200},
                        "size": {"width": 300, "height": 40},
                        "data_source": "time",
                        "font_size": 20,
                        "color": "#FFFFFF",
                        "align": "center",
                        "refresh_ms": 1000
                    }
                ]
            }"##,
        )
        .expect("built-in layout must parse")
    }

    fn validate(&self) -> Result<()> {
        // The panel geometry is fixed; a layout authored for another size is
        // rejected up front rather than scaled.
        if self.display.width != DISPLAY_WIDTH || self.display.height != DISPLAY_HEIGHT {
            return Err(Error::Config(format!(
                "layout is {}x{}, display is {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}",
                self.display.width, self.display.height
            )));
        }
        parse_color(&self.display.background_color)?;
        Ok(())
    }

    pub fn background(&self) -> Rgb888 {
        // Validated in `validate`, so this cannot fail after load.
        parse_color(&self.display.background_color).unwrap_or(Rgb888::new(0, 0, 0))
    }
}

/// Parse a `#RRGGBB` color string.
pub fn parse_color(raw: &str) -> Result<Rgb888> {
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Config(format!("invalid color '{raw}'")));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    Ok(Rgb888::new(channel(0), channel(2), channel(4)))
}

fn default_layout_name() -> String {
    "Unnamed".to_string()
}

fn default_width() -> u16 {
    DISPLAY_WIDTH
}

fn default_height() -> u16 {
    DISPLAY_HEIGHT
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_data_source() -> String {
    "time".to_string()
}

fn default_refresh_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_max_value() -> f64 {
    100.0
}

fn default_num_points() -> usize {
    30
}
