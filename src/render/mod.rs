//! Incremental compositor: decides what subset of the frame must be
//! retransmitted each cycle.
//!
//! Each cycle takes one of two paths. The full-render path (first cycle,
//! periodic refresh, or after a transport error) repaints every widget and
//! emits one display-sized region; since the protocol has no acks, the
//! periodic full resend is the only recovery from silently dropped frames.
//! The incremental path repaints only widgets whose data changed, then
//! merges nearby bounding boxes so fewer header+settle overheads are paid.

use std::path::Path;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb888;

use crate::canvas::{Canvas, Rect, Region};
use crate::layout::Layout;
use crate::metrics::Snapshot;
use crate::widget::{self, Widget};
use crate::{Error, Result};

pub const DEFAULT_FULL_REFRESH_MS: u64 = 30_000;
pub const DEFAULT_MERGE_GAP_PX: u16 = 8;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Force a full-frame resend at least this often.
    pub full_refresh: Duration,
    /// Fold dirty rects whose gap is at most this many pixels in both axes.
    pub merge_gap: u16,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            full_refresh: Duration::from_millis(DEFAULT_FULL_REFRESH_MS),
            merge_gap: DEFAULT_MERGE_GAP_PX,
        }
    }
}

/// Per-widget staleness bookkeeping. Fingerprint and timestamp move only
/// after a successful render.
struct Slot {
    widget: Box<dyn Widget>,
    fingerprint: Option<u64>,
    last_render: Option<Instant>,
}

impl Slot {
    fn is_dirty(&self, fingerprint: u64, now: Instant) -> bool {
        let Some(rendered_at) = self.last_render else {
            return true;
        };
        let elapsed = now.saturating_duration_since(rendered_at);
        elapsed >= self.widget.refresh_interval() && self.fingerprint != Some(fingerprint)
    }
}

pub struct Compositor {
    slots: Vec<Slot>,
    canvas: Canvas,
    background: Rgb888,
    options: RenderOptions,
    last_full: Option<Instant>,
    force_full: bool,
    rejected: Vec<(String, Error)>,
}

impl Compositor {
    /// Build from a layout. Invalid widget descriptors are skipped and
    /// reported via [`Compositor::rejected`]; valid widgets still run.
    pub fn new(layout: &Layout, options: RenderOptions, base_dir: &Path) -> Self {
        let background = layout.background();
        let mut slots = Vec::with_capacity(layout.widgets.len());
        let mut rejected = Vec::new();
        for spec in &layout.widgets {
            match widget::build(spec, background, base_dir) {
                Ok(widget) => slots.push(widget),
                Err(err) => rejected.push((spec.id.clone(), err)),
            }
        }
        let mut compositor = Self::from_widgets(slots, background, options);
        compositor.rejected = rejected;
        compositor
    }

    /// Build from pre-constructed widgets (tests, embedders).
    pub fn from_widgets(
        widgets: Vec<Box<dyn Widget>>,
        background: Rgb888,
        options: RenderOptions,
    ) -> Self {
        Self {
            slots: widgets
                .into_iter()
                .map(|widget| Slot {
                    widget,
                    fingerprint: None,
                    last_render: None,
                })
                .collect(),
            canvas: Canvas::new(),
            background,
            options,
            last_full: None,
            force_full: false,
            rejected: Vec::new(),
        }
    }

    pub fn widget_count(&self) -> usize {
        self.slots.len()
    }

    /// Descriptors rejected at build time, in layout order.
    pub fn rejected(&self) -> &[(String, Error)] {
        &self.rejected
    }

    /// Route the next cycle onto the full-render path. Called after any
    /// transport failure: a partial write cannot be resumed, so the whole
    /// frame is resent instead.
    pub fn mark_transport_error(&mut self) {
        self.force_full = true;
    }

    /// Run one update cycle and return the regions to transmit. A full
    /// render comes back as a single display-sized region.
    pub fn run_cycle(&mut self, snapshot: &Snapshot, now: Instant) -> Result<Vec<Region>> {
        if self.needs_full_render(now) {
            return Ok(vec![self.full_render(snapshot, now)?]);
        }

        let mut dirty = Vec::new();
        for slot in &mut self.slots {
            let fingerprint = slot.widget.fingerprint(snapshot);
            if !slot.is_dirty(fingerprint, now) {
                continue;
            }
            slot.widget.draw(&mut self.canvas, snapshot);
            slot.fingerprint = Some(fingerprint);
            slot.last_render = Some(now);
            dirty.push(slot.widget.bounds());
        }

        merge_rects(dirty, self.options.merge_gap)
            .into_iter()
            .map(|rect| self.canvas.extract(rect))
            .collect()
    }

    fn needs_full_render(&self, now: Instant) -> bool {
        let Some(last) = self.last_full else {
            return true;
        };
        self.force_full || now.saturating_duration_since(last) >= self.options.full_refresh
    }

    fn full_render(&mut self, snapshot: &Snapshot, now: Instant) -> Result<Region> {
        self.canvas.fill(self.background);
        for slot in &mut self.slots {
            let fingerprint = slot.widget.fingerprint(snapshot);
            slot.widget.draw(&mut self.canvas, snapshot);
            slot.fingerprint = Some(fingerprint);
            slot.last_render = Some(now);
        }
        self.last_full = Some(now);
        self.force_full = false;
        self.canvas.extract(Rect::full_frame())
    }
}

/// Fold rectangles whose gap is within `max_gap` on both axes into their
/// bounding rectangle. Sorted by `(y, x)` first so folding is stable;
/// repeated until no more pairs merge, since a union can come within range
/// of a previously distant rect.
pub fn merge_rects(mut rects: Vec<Rect>, max_gap: u16) -> Vec<Rect> {
    rects.sort_by_key(|r| (r.y, r.x));

    loop {
        let mut merged: Vec<Rect> = Vec::with_capacity(rects.len());
        let mut changed = false;

        'next: for rect in rects {
            for out in merged.iter_mut() {
                if out.gap_x(&rect) <= max_gap && out.gap_y(&rect) <= max_gap {
                    *out = out.union(&rect);
                    changed = true;
                    continue 'next;
                }
            }
            merged.push(rect);
        }

        if !changed {
            return merged;
        }
        rects = merged;
    }
}
