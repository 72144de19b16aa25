//! Text widget: renders the bound metric value as a single line.

use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_6X10, FONT_9X15};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::canvas::{Canvas, Rect};
use crate::layout::{self, Align, WidgetSpec};
use crate::metrics::{Snapshot, Value};
use crate::widget::{hash_key, Base, Widget};
use crate::Result;

#[derive(Debug)]
pub struct TextWidget {
    base: Base,
    color: Rgb888,
    align: Align,
    font: &'static MonoFont<'static>,
}

/// Pick the closest built-in monospace face for a requested point size.
pub(crate) fn font_for_size(size: u16) -> &'static MonoFont<'static> {
    if size <= 10 {
        &FONT_6X10
    } else if size <= 16 {
        &FONT_9X15
    } else {
        &FONT_10X20
    }
}

impl TextWidget {
    pub fn new(spec: &WidgetSpec, background: Rgb888) -> Result<Self> {
        let base = Base::from_spec(spec, background)?;
        let color = match &spec.color {
            Some(raw) => layout::parse_color(raw)?,
            None => Rgb888::WHITE,
        };
        Ok(Self {
            base,
            color,
            align: spec.align,
            font: font_for_size(spec.font_size.unwrap_or(20)),
        })
    }

    fn format_value(&self, snapshot: &Snapshot) -> String {
        let value = snapshot.get(&self.base.data_source);
        // Temperatures get their unit; everything else prints verbatim.
        if self.base.data_source.contains("temp") {
            if let Some(Value::Scalar(v)) = value {
                return format!("{v:.0}\u{B0}C");
            }
        }
        value.map(Value::display).unwrap_or_default()
    }
}

impl Widget for TextWidget {
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

        let text = self.format_value(snapshot);
        if text.is_empty() {
            return;
        }

        let (anchor_x, alignment) = match self.align {
            Align::Left => (i32::from(bounds.x), Alignment::Left),
            Align::Center => (
                i32::from(bounds.x) + i32::from(bounds.width) / 2,
                Alignment::Center,
            ),
            Align::Right => (i32::from(bounds.right()) - 1, Alignment::Right),
        };

        let style = MonoTextStyle::new(self.font, self.color);
        let text_style = TextStyleBuilder::new()
            .alignment(alignment)
            .baseline(Baseline::Top)
            .build();
        let _ = Text::with_text_style(
            &text,
            Point::new(anchor_x, i32::from(bounds.y)),
            style,
            text_style,
        )
        .draw(canvas);
    }
}
