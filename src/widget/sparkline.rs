//! Sparkline: a mini trend graph over the metric's recent history.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::canvas::{Canvas, Rect};
use crate::layout::{self, WidgetSpec};
use crate::metrics::Snapshot;
use crate::widget::{Base, Widget};
use crate::Result;

const HEADER_HEIGHT: u16 = 14;

#[derive(Debug)]
pub struct SparklineWidget {
    base: Base,
    label: Option<String>,
    line_color: Rgb888,
    grid_color: Rgb888,
    text_color: Rgb888,
    show_value: bool,
    min_value: f64,
    max_value: f64,
    num_points: usize,
}

impl SparklineWidget {
    pub fn new(spec: &WidgetSpec, background: Rgb888) -> Result<Self> {
        let base = Base::from_spec(spec, background)?;
        let line_color = match &spec.line_color {
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
            line_color,
            grid_color: Rgb888::new(0x33, 0x33, 0x33),
            text_color,
            show_value: spec.show_value,
            min_value: spec.min_value,
            max_value: spec.max_value,
            num_points: spec.num_points.max(2),
        })
    }

    fn graph_rect(&self) -> Rect {
        let bounds = self.base.bounds;
        let header = if self.label.is_some() || self.show_value {
            HEADER_HEIGHT
        } else {
            0
        };
        Rect::new(
            bounds.x + 1,
            bounds.y + header + 1,
            bounds.width.saturating_sub(2).max(2),
            bounds.height.saturating_sub(header + 2).max(2),
        )
    }
}

impl Widget for SparklineWidget {
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
        // The whole visible window matters, not just the newest point.
        let mut hasher = DefaultHasher::new();
        for value in snapshot.history(&self.base.data_source, self.num_points) {
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    fn draw(&self, canvas: &mut Canvas, snapshot: &Snapshot) {
        let bounds = self.base.bounds;
        canvas.fill_rect(bounds, self.base.background);

        let graph = self.graph_rect();
        let _ = Rectangle::new(
            Point::new(i32::from(graph.x) - 1, i32::from(graph.y) - 1),
            Size::new(u32::from(graph.width) + 2, u32::from(graph.height) + 2),
        )
        .into_styled(PrimitiveStyle::with_stroke(self.grid_color, 1))
        .draw(canvas);

        let style = MonoTextStyle::new(&FONT_6X10, self.text_color);
        if let Some(label) = &self.label {
            let left = TextStyleBuilder::new()
                .alignment(Alignment::Left)
                .baseline(Baseline::Top)
                .build();
            let _ = Text::with_text_style(
                label,
                Point::new(i32::from(bounds.x) + 2, i32::from(bounds.y)),
                style,
                left,
            )
            .draw(canvas);
        }

        let history = snapshot.history(&self.base.data_source, self.num_points);
        if self.show_value {
            if let Some(current) = history.last() {
                let right = TextStyleBuilder::new()
                    .alignment(Alignment::Right)
                    .baseline(Baseline::Top)
                    .build();
                let _ = Text::with_text_style(
                    &format!("{current:.1}"),
                    Point::new(i32::from(bounds.right()) - 3, i32::from(bounds.y)),
                    style,
                    right,
                )
                .draw(canvas);
            }
        }

        if history.len() < 2 {
            return;
        }

        let span = (self.max_value - self.min_value).max(f64::EPSILON);
        let x_step = f64::from(graph.width - 1) / (history.len() - 1) as f64;
        let plot = |i: usize, value: f64| -> Point {
            let clamped = value.clamp(self.min_value, self.max_value);
            let norm = (clamped - self.min_value) / span;
            Point::new(
                i32::from(graph.x) + (i as f64 * x_step).round() as i32,
                i32::from(graph.bottom()) - 1 - (norm * f64::from(graph.height - 1)).round() as i32,
            )
        };

        let line_style = PrimitiveStyle::with_stroke(self.line_color, 1);
        for i in 1..history.len() {
            let _ = Line::new(plot(i - 1, history[i - 1]), plot(i, history[i]))
                .into_styled(line_style)
                .draw(canvas);
        }
    }
}
