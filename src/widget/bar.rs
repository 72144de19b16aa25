//! Horizontal progress bar with optional label and value readout.

use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::canvas::{Canvas, Rect};
use crate::layout::{self, WidgetSpec};
use crate::metrics::Snapshot;
use crate::widget::{hash_key, to_percent, Base, Widget};
use crate::Result;

const LABEL_HEIGHT: u16 = 12;
const VALUE_HEIGHT: u16 = 14;

#[derive(Debug)]
pub struct ProgressBarWidget {
    base: Base,
    label: Option<String>,
    bar_color: Rgb888,
    track_color: Rgb888,
    text_color: Rgb888,
    show_value: bool,
    min_value: f64,
    max_value: f64,
}

impl ProgressBarWidget {
    pub fn new(spec: &WidgetSpec, background: Rgb888) -> Result<Self> {
        let base = Base::from_spec(spec, background)?;
        let bar_color = match &spec.bar_color {
            Some(raw) => layout::parse_color(raw)?,
            None => Rgb888::new(0, 255, 0),
        };
        let text_color = match &spec.text_color {
            Some(raw) => layout::parse_color(raw)?,
            None => Rgb888::WHITE,
        };
        Ok(Self {
            base,
            label: spec.label.clone(),
            bar_color,
            track_color: Rgb888::new(0x33, 0x33, 0x33),
            text_color,
            show_value: spec.show_value,
            min_value: spec.min_value,
            max_value: spec.max_value,
        })
    }

    fn bar_rect(&self) -> Rect {
        let bounds = self.base.bounds;
        let top = if self.label.is_some() { LABEL_HEIGHT } else { 0 };
        let bottom = if self.show_value { VALUE_HEIGHT } else { 0 };
        let height = bounds.height.saturating_sub(top + bottom).max(1);
        Rect::new(bounds.x, bounds.y + top, bounds.width, height)
    }
}

impl Widget for ProgressBarWidget {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn bounds(&self) -> Rect {
        self.base.bounds
    }

    fn refresh_interval(&self) -> std::time::Duration {
        self.base.refresh
    }

    fn fingerprint(&self, snapshot: &Snapshot) -> u64 {
        hash_key(snapshot, &self.base.data_source)
    }

    fn draw(&self, canvas: &mut Canvas, snapshot: &Snapshot) {
        let bounds = self.base.bounds;
        canvas.fill_rect(bounds, self.base.background);

        let value = snapshot.scalar(&self.base.data_source).unwrap_or(0.0);
        let percent = to_percent(value, self.min_value, self.max_value);

        let label_style = MonoTextStyle::new(&FONT_6X10, self.text_color);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Top)
            .build();

        if let Some(label) = &self.label {
            let _ = Text::with_text_style(
                label,
                Point::new(i32::from(bounds.x), i32::from(bounds.y)),
                label_style,
                text_style,
            )
            .draw(canvas);
        }

        let bar = self.bar_rect();
        canvas.fill_rect(bar, self.track_color);
        let fill_width =
            (f64::from(bar.width) * percent / 100.0).round() as u16;
        if fill_width > 0 {
            canvas.fill_rect(
                Rect::new(bar.x, bar.y, fill_width.min(bar.width), bar.height),
                self.bar_color,
            );
        }

        if self.show_value {
            let value_text = format!("{percent:.1}%");
            let centered = TextStyleBuilder::new()
                .alignment(Alignment::Center)
                .baseline(Baseline::Top)
                .build();
            let _ = Text::with_text_style(
                &value_text,
                Point::new(
                    i32::from(bounds.x) + i32::from(bounds.width) / 2,
                    i32::from(bar.bottom()) + 2,
                ),
                label_style,
                centered,
            )
            .draw(canvas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::metrics::Value;

    fn widget(extra: &str) -> ProgressBarWidget {
        let layout = Layout::parse(&format!(
            r##"{{"widgets": [{{"type": "progress_bar", "id": "cpu",
                "position": {{"x": 10, "y": 100}},
                "size": {{"width": 300, "height": 50}},
                "data_source": "cpu_percent",
                "bar_color": "#FF0000"{extra}}}]}}"##
        ))
        .unwrap();
        ProgressBarWidget::new(&layout.widgets[0], Rgb888::BLACK).unwrap()
    }

    fn fill_extent(canvas: &Canvas, bar: Rect, color: Rgb888) -> u16 {
        let y = bar.y + bar.height / 2;
        (bar.x..bar.right())
            .take_while(|&x| canvas.pixel(x, y) == Some(color))
            .count() as u16
    }

    #[test]
    fn fill_width_tracks_percentage() {
        let w = widget("");
        let bar = w.bar_rect();

        let mut canvas = Canvas::new();
        let mut snap = Snapshot::new();
        snap.insert("cpu_percent", Value::Scalar(50.0));
        w.draw(&mut canvas, &snap);
        assert_eq!(fill_extent(&canvas, bar, Rgb888::new(255, 0, 0)), 150);

        snap.insert("cpu_percent", Value::Scalar(0.0));
        w.draw(&mut canvas, &snap);
        assert_eq!(fill_extent(&canvas, bar, Rgb888::new(255, 0, 0)), 0);

        snap.insert("cpu_percent", Value::Scalar(100.0));
        w.draw(&mut canvas, &snap);
        assert_eq!(fill_extent(&canvas, bar, Rgb888::new(255, 0, 0)), 300);
    }

    #[test]
    fn overrange_values_clamp_to_full_bar() {
        let w = widget("");
        let bar = w.bar_rect();
        let mut canvas = Canvas::new();
        let mut snap = Snapshot::new();
        snap.insert("cpu_percent", Value::Scalar(400.0));
        w.draw(&mut canvas, &snap);
        assert_eq!(fill_extent(&canvas, bar, Rgb888::new(255, 0, 0)), 300);
    }

    #[test]
    fn label_reserves_header_space() {
        let plain = widget("");
        let labeled = widget(r#", "label": "CPU""#);
        assert_eq!(labeled.bar_rect().y, plain.bar_rect().y + LABEL_HEIGHT);
    }

    #[test]
    fn custom_range_normalizes() {
        let w = widget(r#", "min_value": 20, "max_value": 120"#);
        let bar = w.bar_rect();
        let mut canvas = Canvas::new();
        let mut snap = Snapshot::new();
        snap.insert("cpu_percent", Value::Scalar(70.0));
        w.draw(&mut canvas, &snap);
        // (70-20)/(120-20) = 50% of a 300px bar.
        assert_eq!(fill_extent(&canvas, bar, Rgb888::new(255, 0, 0)), 150);
    }
}
