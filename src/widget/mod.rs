//! Widget abstraction and the built-in widget kinds.
//!
//! A widget owns its placement and data binding and knows how to paint
//! itself into the frame; staleness bookkeeping (fingerprints, timestamps,
//! dirty flags) lives in the compositor. Descriptor problems are rejected
//! here with `Error::Config` so the compositor can skip the widget.

mod bar;
mod gauge;
mod image;
mod sparkline;
mod text;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;

use crate::canvas::{Canvas, Rect};
use crate::layout::{self, WidgetKind, WidgetSpec};
use crate::metrics::Snapshot;
use crate::Result;

pub use bar::ProgressBarWidget;
pub use gauge::GaugeWidget;
pub use image::ImageWidget;
pub use sparkline::SparklineWidget;
pub use text::TextWidget;

/// One drawable unit on the dashboard.
pub trait Widget: Send + std::fmt::Debug {
    fn id(&self) -> &str;

    /// Placement on the display; fixed after construction.
    fn bounds(&self) -> Rect;

    /// Minimum time between re-renders.
    fn refresh_interval(&self) -> Duration;

    /// Digest of the data this widget consumes. The compositor re-renders
    /// only when the digest changes.
    fn fingerprint(&self, snapshot: &Snapshot) -> u64;

    /// Paint the full widget rectangle into the frame.
    fn draw(&self, canvas: &mut Canvas, snapshot: &Snapshot);
}

/// Build a widget from its descriptor. `base_dir` anchors relative asset
/// paths (the layout file's directory).
pub fn build(spec: &WidgetSpec, background: Rgb888, base_dir: &Path) -> Result<Box<dyn Widget>> {
    match spec.kind {
        WidgetKind::Text => Ok(Box::new(TextWidget::new(spec, background)?)),
        WidgetKind::ProgressBar => Ok(Box::new(ProgressBarWidget::new(spec, background)?)),
        WidgetKind::Gauge => Ok(Box::new(GaugeWidget::new(spec, background)?)),
        WidgetKind::Image => Ok(Box::new(ImageWidget::new(spec, base_dir)?)),
        WidgetKind::Sparkline => Ok(Box::new(SparklineWidget::new(spec, background)?)),
    }
}

/// Placement and binding shared by every widget kind.
#[derive(Debug, Clone)]
pub(crate) struct Base {
    pub id: String,
    pub bounds: Rect,
    pub refresh: Duration,
    pub data_source: String,
    pub background: Rgb888,
}

impl Base {
    pub fn from_spec(spec: &WidgetSpec, layout_background: Rgb888) -> Result<Self> {
        let bounds = Rect::new(
            spec.position.x,
            spec.position.y,
            spec.size.width,
            spec.size.height,
        );
        bounds.validate().map_err(|err| {
            crate::Error::Config(format!("widget '{}': {err}", spec.id))
        })?;

        let background = match &spec.background_color {
            Some(raw) => layout::parse_color(raw)?,
            None => layout_background,
        };

        Ok(Self {
            id: spec.id.clone(),
            bounds,
            refresh: Duration::from_millis(spec.refresh_ms),
            data_source: spec.data_source.clone(),
            background,
        })
    }
}

/// Hash the current value of one metric key. Key absence hashes distinctly
/// from any present value.
pub(crate) fn hash_key(snapshot: &Snapshot, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    match snapshot.get(key) {
        Some(value) => {
            1u8.hash(&mut hasher);
            value.hash(&mut hasher);
        }
        None => 0u8.hash(&mut hasher),
    }
    hasher.finish()
}

/// Normalize a value into 0..=100 percent of the `min..max` span.
pub(crate) fn to_percent(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::metrics::Value;

    fn spec_json(kind: &str, x: u16, y: u16, w: u16, h: u16) -> WidgetSpec {
        let layout = Layout::parse(&format!(
            r##"{{"widgets": [{{"type": "{kind}", "id": "t",
                "position": {{"x": {x}, "y": {y}}},
                "size": {{"width": {w}, "height": {h}}},
                "data_source": "cpu_percent"}}]}}"##
        ))
        .unwrap();
        layout.widgets[0].clone()
    }

    #[test]
    fn out_of_bounds_widget_is_rejected() {
        let spec = spec_json("text", 300, 0, 40, 20);
        let err = build(&spec, Rgb888::new(0, 0, 0), Path::new(".")).unwrap_err();
        assert!(format!("{err}").contains("widget 't'"));
    }

    #[test]
    fn zero_size_widget_is_rejected() {
        let spec = spec_json("progress_bar", 0, 0, 0, 20);
        assert!(build(&spec, Rgb888::new(0, 0, 0), Path::new(".")).is_err());
    }

    #[test]
    fn in_bounds_widgets_build() {
        for kind in ["text", "progress_bar", "gauge", "sparkline"] {
            let spec = spec_json(kind, 10, 10, 100, 60);
            let widget = build(&spec, Rgb888::new(0, 0, 0), Path::new(".")).unwrap();
            assert_eq!(widget.bounds(), Rect::new(10, 10, 100, 60));
            assert_eq!(widget.refresh_interval(), Duration::from_millis(1000));
        }
    }

    #[test]
    fn fingerprint_tracks_bound_value() {
        let spec = spec_json("text", 0, 0, 100, 20);
        let widget = build(&spec, Rgb888::new(0, 0, 0), Path::new(".")).unwrap();

        let mut a = Snapshot::new();
        a.insert("cpu_percent", Value::Scalar(10.0));
        let mut b = Snapshot::new();
        b.insert("cpu_percent", Value::Scalar(10.0));
        let mut c = Snapshot::new();
        c.insert("cpu_percent", Value::Scalar(11.0));

        assert_eq!(widget.fingerprint(&a), widget.fingerprint(&b));
        assert_ne!(widget.fingerprint(&a), widget.fingerprint(&c));
    }

    #[test]
    fn percent_normalization_clamps() {
        assert_eq!(to_percent(50.0, 0.0, 100.0), 50.0);
        assert_eq!(to_percent(-5.0, 0.0, 100.0), 0.0);
        assert_eq!(to_percent(250.0, 0.0, 100.0), 100.0);
        assert_eq!(to_percent(75.0, 50.0, 100.0), 50.0);
        assert_eq!(to_percent(1.0, 5.0, 5.0), 0.0);
    }
}
