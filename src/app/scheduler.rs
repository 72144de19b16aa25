use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::Logger;
use crate::metrics::MetricsSource;
use crate::render::Compositor;
use crate::transport::Transport;

const JOIN_POLL: Duration = Duration::from_millis(20);

/// Handle onto the cycle thread. Dropping without `stop` detaches it.
pub struct Scheduler {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the fetch/render/send loop on its own thread. `running` is
    /// shared with the caller so a signal handler can stop the loop too.
    pub fn spawn<M>(
        mut compositor: Compositor,
        mut source: M,
        transport: Arc<Transport>,
        logger: Arc<Logger>,
        interval: Duration,
        running: Arc<AtomicBool>,
    ) -> Self
    where
        M: MetricsSource + Send + 'static,
    {
        let flag = running.clone();
        let handle = thread::spawn(move || {
            run_loop(
                &mut compositor,
                &mut source,
                &transport,
                &logger,
                interval,
                &flag,
            );
        });
        Self { running, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request shutdown and wait up to `timeout` for the thread to exit.
    /// Returns false when the loop is still mid-cycle after the deadline;
    /// the caller then tears the transport down anyway.
    pub fn stop(self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::SeqCst);
        let deadline = Instant::now() + timeout;
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(JOIN_POLL);
        }
        self.handle.join().is_ok()
    }
}

/// One cycle per interval: sample, composite, transmit, sleep off the
/// remainder. A transport failure is logged and routes the next cycle onto
/// the full-render path; the loop itself never dies on a bad cycle.
fn run_loop<M: MetricsSource>(
    compositor: &mut Compositor,
    source: &mut M,
    transport: &Transport,
    logger: &Logger,
    interval: Duration,
    running: &AtomicBool,
) {
    while running.load(Ordering::SeqCst) {
        let started = Instant::now();

        let snapshot = source.sample();
        match compositor.run_cycle(&snapshot, started) {
            Ok(regions) => {
                for region in &regions {
                    if let Err(err) = transport.send_region(region) {
                        logger.warn(format!(
                            "region send failed ({}x{} at {},{}): {err}",
                            region.width, region.height, region.x, region.y
                        ));
                        compositor.mark_transport_error();
                        break;
                    }
                }
                if !regions.is_empty() {
                    logger.debug(format!(
                        "cycle sent {} region(s) in {:?}",
                        regions.len(),
                        started.elapsed()
                    ));
                }
            }
            Err(err) => logger.error(format!("render cycle failed: {err}")),
        }

        let elapsed = started.elapsed();
        if let Some(remaining) = interval.checked_sub(elapsed) {
            sleep_while_running(remaining, running);
        }
    }
}

// Sleep in short slices so a stop request is noticed promptly.
fn sleep_while_running(total: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(JOIN_POLL));
    }
}
