use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;

use super::Logger;
use crate::canvas::{Rect, Region};
use crate::transport::Transport;
use crate::Result;

const HOLD: Duration = Duration::from_secs(1);

/// Panel smoke test: cycle solid full-frame fills until stopped. Exercises
/// the whole wire path without touching the metrics or widget stack.
pub(super) fn run_demo(
    transport: &Transport,
    logger: &Logger,
    running: &AtomicBool,
) -> Result<()> {
    let palette: [(Rgb888, &str); 5] = [
        (Rgb888::new(255, 0, 0), "red"),
        (Rgb888::new(0, 255, 0), "green"),
        (Rgb888::new(0, 0, 255), "blue"),
        (Rgb888::WHITE, "white"),
        (Rgb888::BLACK, "black"),
    ];

    while running.load(Ordering::SeqCst) {
        for (color, name) in palette {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            logger.info(format!("demo fill: {name}"));
            let region = Region::solid(Rect::full_frame(), color)?;
            transport.send_region(&region)?;
            hold_while_running(HOLD, running);
        }
    }
    Ok(())
}

fn hold_while_running(total: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
}
