//! Static image widget, fed by a BMP file decoded at build time.

use std::path::Path;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use tinybmp::Bmp;

use crate::canvas::{Canvas, Rect};
use crate::layout::WidgetSpec;
use crate::metrics::Snapshot;
use crate::widget::{Base, Widget};
use crate::{Error, Result};

#[derive(Debug)]
pub struct ImageWidget {
    base: Base,
    // Decoded once; row-major, exactly bounds.width * bounds.height pixels.
    pixels: Vec<Rgb888>,
}

impl ImageWidget {
    pub fn new(spec: &WidgetSpec, base_dir: &Path) -> Result<Self> {
        let base = Base::from_spec(spec, Rgb888::BLACK)?;
        let rel = spec.path.as_deref().ok_or_else(|| {
            Error::Config(format!("widget '{}': image requires a path", spec.id))
        })?;
        let path = base_dir.join(rel);
        let raw = std::fs::read(&path).map_err(|err| {
            Error::Config(format!(
                "widget '{}': cannot read {}: {err}",
                spec.id,
                path.display()
            ))
        })?;

        let bmp: Bmp<Rgb888> = Bmp::from_slice(&raw).map_err(|err| {
            Error::Config(format!("widget '{}': invalid bmp: {err:?}", spec.id))
        })?;

        let size = bmp.size();
        if size.width != u32::from(base.bounds.width)
            || size.height != u32::from(base.bounds.height)
        {
            // Never silently scaled; the asset must match the declared size.
            return Err(Error::Config(format!(
                "widget '{}': image is {}x{}, widget is {}x{}",
                spec.id, size.width, size.height, base.bounds.width, base.bounds.height
            )));
        }

        let mut pixels =
            vec![Rgb888::BLACK; usize::from(base.bounds.width) * usize::from(base.bounds.height)];
        for Pixel(point, color) in bmp.pixels() {
            let idx = point.y as usize * usize::from(base.bounds.width) + point.x as usize;
            pixels[idx] = color;
        }

        Ok(Self { base, pixels })
    }
}

impl Widget for ImageWidget {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn bounds(&self) -> Rect {
        self.base.bounds
    }

    fn refresh_interval(&self) -> std::time::Duration {
        self.base.refresh
    }

    fn fingerprint(&self, _snapshot: &Snapshot) -> u64 {
        // Static content: identical digest every cycle, so the widget only
        // renders on the full-render path.
        0
    }

    fn draw(&self, canvas: &mut Canvas, _snapshot: &Snapshot) {
        let bounds = self.base.bounds;
        let _ = canvas.draw_iter(self.pixels.iter().enumerate().map(|(i, color)| {
            let x = (i % usize::from(bounds.width)) as i32 + i32::from(bounds.x);
            let y = (i / usize::from(bounds.width)) as i32 + i32::from(bounds.y);
            Pixel(Point::new(x, y), *color)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    // Minimal 24-bit BMP writer for fixtures.
    fn write_bmp(path: &Path, width: u32, height: u32, color: (u8, u8, u8)) {
        let row_len = (width * 3 + 3) & !3;
        let pixel_bytes = row_len * height;
        let file_size = 54 + pixel_bytes;
        let mut data = Vec::with_capacity(file_size as usize);
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&file_size.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&54u32.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&[0; 4]); // BI_RGB
        data.extend_from_slice(&pixel_bytes.to_le_bytes());
        data.extend_from_slice(&[0; 16]);
        for _ in 0..height {
            for _ in 0..width {
                data.extend_from_slice(&[color.2, color.1, color.0]);
            }
            for _ in 0..(row_len - width * 3) {
                data.push(0);
            }
        }
        std::fs::write(path, data).unwrap();
    }

    fn spec(path_field: &str, w: u16, h: u16) -> WidgetSpec {
        let layout = Layout::parse(&format!(
            r##"{{"widgets": [{{"type": "image", "id": "logo",
                "position": {{"x": 5, "y": 5}},
                "size": {{"width": {w}, "height": {h}}},
                "path": "{path_field}"}}]}}"##
        ))
        .unwrap();
        layout.widgets[0].clone()
    }

    #[test]
    fn loads_and_blits_matching_bmp() {
        let dir = tempfile::tempdir().unwrap();
        write_bmp(&dir.path().join("logo.bmp"), 8, 4, (255, 0, 0));

        let widget = ImageWidget::new(&spec("logo.bmp", 8, 4), dir.path()).unwrap();
        let mut canvas = Canvas::new();
        widget.draw(&mut canvas, &Snapshot::new());
        assert_eq!(canvas.pixel(5, 5), Some(Rgb888::new(255, 0, 0)));
        assert_eq!(canvas.pixel(12, 8), Some(Rgb888::new(255, 0, 0)));
        assert_eq!(canvas.pixel(13, 9), Some(Rgb888::BLACK));
    }

    #[test]
    fn rejects_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_bmp(&dir.path().join("logo.bmp"), 8, 4, (0, 0, 255));
        let err = ImageWidget::new(&spec("logo.bmp", 16, 4), dir.path()).unwrap_err();
        assert!(format!("{err}").contains("image is 8x4"));
    }

    #[test]
    fn rejects_missing_file_and_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageWidget::new(&spec("absent.bmp", 8, 4), dir.path()).is_err());

        let mut s = spec("logo.bmp", 8, 4);
        s.path = None;
        let err = ImageWidget::new(&s, dir.path()).unwrap_err();
        assert!(format!("{err}").contains("requires a path"));
    }
}
