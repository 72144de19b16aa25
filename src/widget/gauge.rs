//! Arc gauge: a 270-degree dial with a value readout in the middle.

use embedded_graphics::mono_font::iso_8859_1::FONT_9X15;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::canvas::{Canvas, Rect};
use crate::layout::{self, WidgetSpec};
use crate::metrics::Snapshot;
use crate::widget::{hash_key, to_percent, Base, Widget};
use crate::Result;

// Dial opens downward: sweep 270 degrees starting at the lower left.
const SWEEP_DEGREES: f32 = 270.0;
const START_DEGREES: f32 = 135.0;
const STROKE_WIDTH: u32 = 8;

#[derive(Debug)]
pub struct GaugeWidget {
    base: Base,
    color: Rgb888,
    track_color: Rgb888,
    text_color: Rgb888,
    show_value: bool,
    min_value: f64,
    max_value: f64,
}

impl GaugeWidget {
    pub fn new(spec: &WidgetSpec, background: Rgb888) -> Result<Self> {
        let base = Base::from_spec(spec, background)?;
        let color = match &spec.color {
            Some(raw) => layout::parse_color(raw)?,
            None => Rgb888::new(0, 255, 136),
        };
        let text_color = match &spec.text_color {
            Some(raw) => layout::parse_color(raw)?,
            None => Rgb888::WHITE,
        };
        Ok(Self {
            base,
            color,
            track_color: Rgb888::new(0x30, 0x30, 0x30),
            text_color,
            show_value: spec.show_value,
            min_value: spec.min_value,
            max_value: spec.max_value,
        })
    }

    fn dial_diameter(&self) -> u32 {
        let side = self.base.bounds.width.min(self.base.bounds.height);
        u32::from(side.saturating_sub(4).max(8))
    }

    fn dial_top_left(&self) -> Point {
        let bounds = self.base.bounds;
        let diameter = self.dial_diameter() as i32;
        Point::new(
            i32::from(bounds.x) + (i32::from(bounds.width) - diameter) / 2,
            i32::from(bounds.y) + (i32::from(bounds.height) - diameter) / 2,
        )
    }
}

impl Widget for GaugeWidget {
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

        let top_left = self.dial_top_left();
        let diameter = self.dial_diameter();

        let _ = Arc::new(
            top_left,
            diameter,
            Angle::from_degrees(START_DEGREES),
            Angle::from_degrees(SWEEP_DEGREES),
        )
        .into_styled(PrimitiveStyle::with_stroke(self.track_color, STROKE_WIDTH))
        .draw(canvas);

        let sweep = SWEEP_DEGREES * (percent as f32) / 100.0;
        if sweep > 0.0 {
            let _ = Arc::new(
                top_left,
                diameter,
                Angle::from_degrees(START_DEGREES),
                Angle::from_degrees(sweep),
            )
            .into_styled(PrimitiveStyle::with_stroke(self.color, STROKE_WIDTH))
            .draw(canvas);
        }

        if self.show_value {
            let text = format!("{value:.0}");
            let style = MonoTextStyle::new(&FONT_9X15, self.text_color);
            let text_style = TextStyleBuilder::new()
                .alignment(Alignment::Center)
                .baseline(Baseline::Middle)
                .build();
            let center = Point::new(
                top_left.x + diameter as i32 / 2,
                top_left.y + diameter as i32 / 2,
            );
            let _ = Text::with_text_style(&text, center, style, text_style).draw(canvas);
        }
    }
}
