//! Metric collection: the data source widgets bind to.
//!
//! One snapshot is taken per update cycle. Scalar metrics also feed bounded
//! per-key history rings for sparkline widgets.

use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use sysinfo::{Components, System};

/// Current value for a metric key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Text(String),
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Human-readable form used by text widgets.
    pub fn display(&self) -> String {
        match self {
            Value::Scalar(v) if v.fract() == 0.0 => format!("{v:.0}"),
            Value::Scalar(v) => format!("{v:.1}"),
            Value::Text(s) => s.clone(),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Scalar(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            Value::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// Immutable view of all metrics for one cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: HashMap<String, Value>,
    history: HashMap<String, Vec<f64>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn insert_history(&mut self, key: impl Into<String>, points: Vec<f64>) {
        self.history.insert(key.into(), points);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_scalar)
    }

    /// Up to `n` most recent points for a key, oldest first.
    pub fn history(&self, key: &str, n: usize) -> &[f64] {
        match self.history.get(key) {
            Some(points) => {
                let start = points.len().saturating_sub(n);
                &points[start..]
            }
            None => &[],
        }
    }
}

/// Anything that can produce a metrics snapshot once per cycle.
pub trait MetricsSource {
    fn sample(&mut self) -> Snapshot;
}

const HISTORY_CAPACITY: usize = 120;

/// sysinfo-backed collector: CPU, memory, temperature, clock.
pub struct SystemMetrics {
    sys: System,
    components: Components,
    history: HashMap<String, VecDeque<f64>>,
}

impl SystemMetrics {
    pub fn new() -> Self {
        Self {
            sys: System::new(),
            components: Components::new_with_refreshed_list(),
            history: HashMap::new(),
        }
    }

    fn record(&mut self, key: &str, value: f64) {
        let ring = self
            .history
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(HISTORY_CAPACITY));
        if ring.len() == HISTORY_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(value);
    }

    fn cpu_temperature(&self) -> Option<f64> {
        // Pick the first component that looks like a CPU/package sensor.
        for component in self.components.iter() {
            let label = component.label().to_ascii_lowercase();
            if label.contains("cpu")
                || label.contains("tctl")
                || label.contains("package")
                || label.contains("core")
            {
                if let Some(temp) = component.temperature() {
                    return Some(f64::from(temp));
                }
            }
        }
        None
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SystemMetrics {
    fn sample(&mut self) -> Snapshot {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.components.refresh(false);

        let mut snap = Snapshot::new();

        let cpu = f64::from(self.sys.global_cpu_usage());
        snap.insert("cpu_percent", Value::Scalar(cpu));
        self.record("cpu_percent", cpu);

        let total = self.sys.total_memory() as f64;
        let used = self.sys.used_memory() as f64;
        let ram_percent = if total > 0.0 { used / total * 100.0 } else { 0.0 };
        const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
        snap.insert("ram_percent", Value::Scalar(ram_percent));
        snap.insert("ram_used", Value::Scalar(used / GIB));
        snap.insert("ram_total", Value::Scalar(total / GIB));
        self.record("ram_percent", ram_percent);

        if let Some(temp) = self.cpu_temperature() {
            snap.insert("cpu_temp", Value::Scalar(temp));
            self.record("cpu_temp", temp);
        }

        if let Some(cpu) = self.sys.cpus().first() {
            snap.insert("cpu_name", Value::Text(cpu.brand().trim().to_string()));
        }
        if let Some(host) = System::host_name() {
            snap.insert("host", Value::Text(host));
        }

        let now = chrono::Local::now();
        snap.insert("time", Value::Text(now.format("%H:%M:%S").to_string()));
        snap.insert("date", Value::Text(now.format("%a, %b %d").to_string()));

        for (key, ring) in &self.history {
            snap.insert_history(key.clone(), ring.iter().copied().collect());
        }

        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_display_trims_integral_values() {
        assert_eq!(Value::Scalar(42.0).display(), "42");
        assert_eq!(Value::Scalar(42.5).display(), "42.5");
        assert_eq!(Value::Text("abc".into()).display(), "abc");
    }

    #[test]
    fn history_returns_most_recent_points() {
        let mut snap = Snapshot::new();
        snap.insert_history("cpu_percent", vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(snap.history("cpu_percent", 2), &[3.0, 4.0]);
        assert_eq!(snap.history("cpu_percent", 10), &[1.0, 2.0, 3.0, 4.0]);
        assert!(snap.history("missing", 5).is_empty());
    }

    #[test]
    fn system_metrics_always_carries_clock_and_cpu() {
        let mut source = SystemMetrics::new();
        let snap = source.sample();
        assert!(snap.get("time").is_some());
        assert!(snap.get("date").is_some());
        assert!(snap.scalar("cpu_percent").is_some());
        assert!(snap.scalar("ram_percent").is_some());
    }

    #[test]
    fn history_ring_is_bounded() {
        let mut source = SystemMetrics::new();
        for i in 0..(HISTORY_CAPACITY + 10) {
            source.record("cpu_percent", i as f64);
        }
        assert_eq!(source.history["cpu_percent"].len(), HISTORY_CAPACITY);
        assert_eq!(source.history["cpu_percent"].front(), Some(&10.0));
    }
}
