use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// 批次進度與資源用量的快照
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub frames: usize,
    pub elapsed: Duration,
    /// 行程 CPU 使用率；未啟用或無法取得時為 None
    pub cpu_usage: Option<f32>,
    pub memory_mb: Option<u64>,
    pub peak_memory_mb: Option<u64>,
}

impl BatchProgress {
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(feature = "cli")]
struct ProcessSampler {
    system: Mutex<System>,
    pid: Pid,
    peak_memory_mb: AtomicUsize,
}

#[cfg(feature = "cli")]
impl ProcessSampler {
    fn new() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Resource monitoring unavailable: {}", e);
                return None;
            }
        };
        Some(Self {
            system: Mutex::new(System::new()),
            pid,
            peak_memory_mb: AtomicUsize::new(0),
        })
    }

    /// (CPU %, 記憶體 MB, 峰值 MB)
    fn sample(&self) -> Option<(f32, u64, u64)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        let process = system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let peak = self
            .peak_memory_mb
            .fetch_max(memory_mb as usize, Ordering::SeqCst)
            .max(memory_mb as usize);
        Some((process.cpu_usage(), memory_mb, peak as u64))
    }
}

/// Counts analyzed frames and, when enabled, samples this process's CPU and
/// memory at batch checkpoints. Without the `cli` feature only counting is done.
pub struct SystemMonitor {
    enabled: bool,
    started: Instant,
    frames: AtomicUsize,
    #[cfg(feature = "cli")]
    sampler: Option<ProcessSampler>,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
            frames: AtomicUsize::new(0),
            #[cfg(feature = "cli")]
            sampler: if enabled { ProcessSampler::new() } else { None },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn frame_done(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    pub fn progress(&self) -> BatchProgress {
        #[cfg(feature = "cli")]
        let sample = self.sampler.as_ref().and_then(ProcessSampler::sample);
        #[cfg(not(feature = "cli"))]
        let sample: Option<(f32, u64, u64)> = None;

        BatchProgress {
            frames: self.frames.load(Ordering::SeqCst),
            elapsed: self.started.elapsed(),
            cpu_usage: sample.map(|s| s.0),
            memory_mb: sample.map(|s| s.1),
            peak_memory_mb: sample.map(|s| s.2),
        }
    }

    pub fn log_progress(&self, phase: &str) {
        if !self.enabled {
            return;
        }
        let progress = self.progress();
        match (progress.cpu_usage, progress.memory_mb, progress.peak_memory_mb) {
            (Some(cpu), Some(memory), Some(peak)) => tracing::info!(
                "📊 {} - {} frames ({:.1} fps), CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
                phase,
                progress.frames,
                progress.frames_per_second(),
                cpu,
                memory,
                peak
            ),
            _ => tracing::info!(
                "📊 {} - {} frames ({:.1} fps)",
                phase,
                progress.frames,
                progress.frames_per_second()
            ),
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_still_counts_frames() {
        let monitor = SystemMonitor::new(false);
        monitor.frame_done();
        monitor.frame_done();

        let progress = monitor.progress();
        assert!(!monitor.is_enabled());
        assert_eq!(progress.frames, 2);
        assert_eq!(progress.memory_mb, None);
    }

    #[test]
    fn test_frames_per_second() {
        let progress = BatchProgress {
            frames: 30,
            elapsed: Duration::from_secs(2),
            cpu_usage: None,
            memory_mb: None,
            peak_memory_mb: None,
        };
        assert_eq!(progress.frames_per_second(), 15.0);

        let idle = BatchProgress {
            elapsed: Duration::ZERO,
            ..progress
        };
        assert_eq!(idle.frames_per_second(), 0.0);
    }
}
