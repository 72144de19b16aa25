//! End-to-end pipeline: layout file to compositor to serial frames.

use std::path::Path;
use std::time::{Duration, Instant};

use turingmon::canvas::Rect;
use turingmon::config::{self, Config};
use turingmon::layout::Layout;
use turingmon::metrics::{Snapshot, Value};
use turingmon::proto;
use turingmon::render::{Compositor, RenderOptions};
use turingmon::transport::fake::FakeLink;
use turingmon::transport::Transport;

fn snapshot(cpu: f64) -> Snapshot {
    let mut snap = Snapshot::new();
    snap.insert("time", Value::Text("14:30:05".into()));
    snap.insert("date", Value::Text("Wed, Aug 27".into()));
    snap.insert("cpu_percent", Value::Scalar(cpu));
    snap.insert("ram_percent", Value::Scalar(41.5));
    snap.insert("cpu_temp", Value::Scalar(52.0));
    snap.insert("host", Value::Text("testhost".into()));
    snap.insert_history("cpu_percent", vec![10.0, 20.0, cpu]);
    snap
}

fn shipped_layout() -> Layout {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("layouts/default.json");
    Layout::load(&path).unwrap()
}

#[test]
fn shipped_layout_builds_every_widget() {
    let layout = shipped_layout();
    let compositor = Compositor::new(&layout, RenderOptions::default(), Path::new("."));
    assert_eq!(compositor.widget_count(), layout.widgets.len());
    assert!(compositor.rejected().is_empty());
}

#[test]
fn first_cycle_transmits_one_full_frame() {
    let layout = shipped_layout();
    let mut compositor = Compositor::new(&layout, RenderOptions::default(), Path::new("."));

    let (link, log) = FakeLink::new();
    let transport = Transport::from_link(Box::new(link));

    let regions = compositor.run_cycle(&snapshot(25.0), Instant::now()).unwrap();
    assert_eq!(regions.len(), 1);
    for region in &regions {
        transport.send_region(region).unwrap();
    }

    let bytes = log.bytes();
    let header = proto::bitmap_header(0, 0, 319, 479);
    assert_eq!(&bytes[..6], header.as_slice());
    assert_eq!(bytes.len(), 6 + 320 * 480 * 2);
}

#[test]
fn quiet_cycles_send_nothing_and_changes_send_partials() {
    let layout = shipped_layout();
    let mut compositor = Compositor::new(&layout, RenderOptions::default(), Path::new("."));

    let (link, log) = FakeLink::new();
    let transport = Transport::from_link(Box::new(link));

    let base = Instant::now();
    let first = compositor.run_cycle(&snapshot(25.0), base).unwrap();
    assert_eq!(first.len(), 1);
    log.clear();

    // Same data, interval elapsed: nothing to send.
    let quiet = compositor
        .run_cycle(&snapshot(25.0), base + Duration::from_secs(2))
        .unwrap();
    assert!(quiet.is_empty());

    // CPU moved: the dirty regions cover much less than the full frame.
    let partial = compositor
        .run_cycle(&snapshot(80.0), base + Duration::from_secs(4))
        .unwrap();
    assert!(!partial.is_empty());
    let full = Rect::full_frame();
    let full_area = u32::from(full.width) * u32::from(full.height);
    let sent_area: u32 = partial
        .iter()
        .map(|r| u32::from(r.width) * u32::from(r.height))
        .sum();
    assert!(sent_area < full_area / 2);

    for region in &partial {
        transport.send_region(region).unwrap();
        assert!(!region.is_full_frame());
        assert_eq!(
            region.pixels.len(),
            usize::from(region.width) * usize::from(region.height) * 2
        );
    }
    assert!(!log.bytes().is_empty());
}

#[test]
fn failed_send_recovers_with_a_full_frame() {
    let layout = shipped_layout();
    let mut compositor = Compositor::new(&layout, RenderOptions::default(), Path::new("."));

    let (link, log) = FakeLink::new();
    let transport = Transport::from_link(Box::new(link));

    let base = Instant::now();
    let first = compositor.run_cycle(&snapshot(25.0), base).unwrap();
    transport.send_region(&first[0]).unwrap();

    let partial = compositor
        .run_cycle(&snapshot(80.0), base + Duration::from_secs(2))
        .unwrap();
    log.fail_next_writes(1);
    assert!(transport.send_region(&partial[0]).is_err());
    compositor.mark_transport_error();

    let recovery = compositor
        .run_cycle(&snapshot(80.0), base + Duration::from_secs(4))
        .unwrap();
    assert_eq!(recovery.len(), 1);
    assert!(recovery[0].is_full_frame());
}

#[test]
fn config_file_round_trips_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let cfg = Config {
        device: "/dev/ttyACM0".into(),
        brightness: 70,
        update_interval_ms: 500,
        layout: Some("layouts/default.json".into()),
        ..Config::default()
    };
    config::save_to_path(&cfg, &path).unwrap();
    assert_eq!(config::load_from_path(&path).unwrap(), cfg);
}
