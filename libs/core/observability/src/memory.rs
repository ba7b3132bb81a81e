//! Process memory sampling and the periodic high-usage monitor.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use sysinfo::{Pid, System};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Default sampling interval (5 minutes)
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Usage above this fraction of total memory is reported as high
pub const DEFAULT_HIGH_USAGE_RATIO: f64 = 0.80;

/// One reading of the process memory counters, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemorySample {
    /// Resident set size of this process
    pub resident: u64,
    /// Virtual memory reserved by this process
    pub virtual_memory: u64,
    /// Memory available to the process (machine total)
    pub total: u64,
}

impl MemorySample {
    /// Fraction of `total` held resident by this process.
    pub fn used_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.resident as f64 / self.total as f64
    }

    pub fn is_high(&self, threshold: f64) -> bool {
        self.used_ratio() > threshold
    }
}

/// Format bytes as megabytes rounded to two decimals, e.g. `"42.17 MB"`.
pub fn format_mb(bytes: u64) -> String {
    let mb = (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0;
    format!("{} MB", mb)
}

/// Reusable reader for this process's memory counters.
pub struct MemorySampler {
    system: System,
    pid: Option<Pid>,
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn sample(&mut self) -> MemorySample {
        self.system.refresh_memory();

        let (resident, virtual_memory) = match self.pid {
            Some(pid) if self.system.refresh_process(pid) => self
                .system
                .process(pid)
                .map(|p| (p.memory(), p.virtual_memory()))
                .unwrap_or_default(),
            _ => (0, 0),
        };

        MemorySample {
            resident,
            virtual_memory,
            total: self.system.total_memory(),
        }
    }
}

/// A [`MemorySampler`] shared by request handlers.
///
/// Each read refreshes the counters on the blocking pool; nothing is cached
/// between calls.
#[derive(Clone, Default)]
pub struct SharedMemorySampler {
    inner: Arc<Mutex<MemorySampler>>,
}

impl SharedMemorySampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sample(&self) -> MemorySample {
        let inner = self.inner.clone();
        let reading = tokio::task::spawn_blocking(move || {
            inner.lock().unwrap_or_else(PoisonError::into_inner).sample()
        })
        .await;

        reading.unwrap_or_else(|e| {
            warn!("Memory sampling failed: {}", e);
            MemorySample::default()
        })
    }
}

/// Settings for [`spawn_memory_monitor`].
#[derive(Debug, Clone)]
pub struct MemoryMonitorConfig {
    pub interval: Duration,
    pub high_usage_ratio: f64,
}

impl Default for MemoryMonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            high_usage_ratio: DEFAULT_HIGH_USAGE_RATIO,
        }
    }
}

/// Log one sample: warning when usage is high, debug otherwise.
pub fn log_sample(sample: &MemorySample, high_usage_ratio: f64) {
    let rss = format_mb(sample.resident);
    let virtual_memory = format_mb(sample.virtual_memory);
    let total = format_mb(sample.total);
    let used_percent = format!("{:.1}%", sample.used_ratio() * 100.0);

    if sample.is_high(high_usage_ratio) {
        warn!(%rss, %virtual_memory, %total, %used_percent, "High Memory Usage");
    } else {
        debug!(%rss, %virtual_memory, %total, %used_percent, "Memory Usage");
    }
}

/// Spawn the periodic sampler. It runs until the process exits.
///
/// The first sample is taken one full interval after spawning.
pub fn spawn_memory_monitor(config: MemoryMonitorConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sampler = MemorySampler::new();
        let start = tokio::time::Instant::now() + config.interval;
        let mut ticker = tokio::time::interval_at(start, config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            log_sample(&sampler.sample(), config.high_usage_ratio);
        }
    })
}
