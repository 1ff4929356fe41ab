//! Ways of putting a [`PoseDetector`] behind the analyzer.
//!
//! A stateful detector cannot be driven from two frames at once. The
//! strategies here trade tracking continuity against contention:
//!
//! - [`SharedDetector`]: one long-lived instance, `detect` calls serialized by
//!   a lock held around the call only.
//! - [`PerCallDetector`]: a fresh instance per frame, nothing shared.
//! - [`DetectorPool`]: several independent instances checked out per call.
//! - [`DetectorWorker`]: a dedicated thread owns the instance and receives
//!   requests over a channel.
//!
//! Inference runs off the async runtime. A panicking detector is reported as
//! [`DetectorError::Panicked`] rather than taking the caller down.

use crate::domain::{Detection, DetectorMode, DetectorSettings, LandmarkSource, PoseDetector};
use crate::utils::error::{panic_message, DetectorError};
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, oneshot, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;

pub type DetectorFactory<D> =
    Arc<dyn Fn(&DetectorSettings) -> Result<D, DetectorError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum SharingStrategy {
    Shared,
    PerCall,
    Pool,
    Worker,
}

impl SharingStrategy {
    /// 追蹤模式需要同一個實例看到連續畫面
    pub fn default_for(mode: DetectorMode) -> Self {
        match mode {
            DetectorMode::Tracking => SharingStrategy::Shared,
            DetectorMode::Static => SharingStrategy::PerCall,
        }
    }
}

fn join_failure(err: JoinError) -> DetectorError {
    if err.is_panic() {
        DetectorError::Panicked {
            message: panic_message(err.into_panic()),
        }
    } else {
        DetectorError::Unavailable {
            message: err.to_string(),
        }
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, DetectorError>
where
    F: FnOnce() -> Result<T, DetectorError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(join_failure)?
}

/// One detector instance shared by every caller.
pub struct SharedDetector<D: PoseDetector> {
    inner: Arc<Mutex<D>>,
}

impl<D: PoseDetector> SharedDetector<D> {
    pub fn new(detector: D) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }
}

#[async_trait]
impl<D: PoseDetector> LandmarkSource for SharedDetector<D> {
    async fn detect(&self, image: RgbImage) -> Result<Detection, DetectorError> {
        // 只在 detect 期間持有鎖
        let mut guard = Arc::clone(&self.inner).lock_owned().await;
        run_blocking(move || guard.detect(&image)).await
    }

    async fn reset(&self) -> Result<(), DetectorError> {
        self.inner.lock().await.reset();
        Ok(())
    }

    fn strategy_name(&self) -> &'static str {
        "shared"
    }
}

/// Builds a new detector for every frame. No state survives between calls.
pub struct PerCallDetector<D: PoseDetector> {
    factory: DetectorFactory<D>,
    settings: DetectorSettings,
}

impl<D: PoseDetector> PerCallDetector<D> {
    pub fn new(factory: DetectorFactory<D>, settings: DetectorSettings) -> Self {
        Self { factory, settings }
    }
}

#[async_trait]
impl<D: PoseDetector> LandmarkSource for PerCallDetector<D> {
    async fn detect(&self, image: RgbImage) -> Result<Detection, DetectorError> {
        let factory = Arc::clone(&self.factory);
        let settings = self.settings;
        run_blocking(move || {
            let mut detector = factory(&settings)?;
            detector.detect(&image)
        })
        .await
    }

    async fn reset(&self) -> Result<(), DetectorError> {
        Ok(())
    }

    fn strategy_name(&self) -> &'static str {
        "per_call"
    }
}

/// A fixed set of detector instances, one checked out per in-flight frame.
///
/// The blocking task that runs `detect` puts the instance back and only then
/// releases its permit, so a caller that gives up waiting never loses an
/// instance. An instance whose `detect` panics is dropped and the pool shrinks
/// by one; once every instance is gone the pool reports itself unavailable.
pub struct DetectorPool<D: PoseDetector> {
    slots: Arc<PoolSlots<D>>,
}

struct PoolSlots<D> {
    idle: StdMutex<Vec<D>>,
    permits: Arc<Semaphore>,
    live: AtomicUsize,
}

impl<D> PoolSlots<D> {
    fn lock_idle(&self) -> Result<std::sync::MutexGuard<'_, Vec<D>>, DetectorError> {
        self.idle.lock().map_err(|_| DetectorError::Unavailable {
            message: "detector pool state poisoned".to_string(),
        })
    }

    /// 實例遺失：permit 不歸還，池容量永久減一
    fn retire(&self, permit: OwnedSemaphorePermit, reason: &str) {
        permit.forget();
        let remaining = self.live.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        tracing::warn!("Detector instance lost, {} left in pool: {}", remaining, reason);
        if remaining == 0 {
            self.permits.close();
        }
    }
}

impl<D: PoseDetector> DetectorPool<D> {
    pub fn new(detectors: Vec<D>) -> Self {
        let size = detectors.len();
        let permits = Arc::new(Semaphore::new(size));
        if size == 0 {
            permits.close();
        }
        Self {
            slots: Arc::new(PoolSlots {
                idle: StdMutex::new(detectors),
                permits,
                live: AtomicUsize::new(size),
            }),
        }
    }

    pub fn from_factory(
        factory: &DetectorFactory<D>,
        settings: &DetectorSettings,
        size: usize,
    ) -> Result<Self, DetectorError> {
        let detectors = (0..size)
            .map(|_| factory(settings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(detectors))
    }

    pub fn live_instances(&self) -> usize {
        self.slots.live.load(Ordering::SeqCst)
    }

    /// 目前閒置、可立即取用的實例數
    pub fn idle_instances(&self) -> usize {
        self.slots.lock_idle().map(|idle| idle.len()).unwrap_or(0)
    }

    fn closed() -> DetectorError {
        DetectorError::Unavailable {
            message: "detector pool has no live instances".to_string(),
        }
    }
}

#[async_trait]
impl<D: PoseDetector> LandmarkSource for DetectorPool<D> {
    async fn detect(&self, image: RgbImage) -> Result<Detection, DetectorError> {
        let permit = Arc::clone(&self.slots.permits)
            .acquire_owned()
            .await
            .map_err(|_| Self::closed())?;

        let checked_out = self.slots.lock_idle()?.pop();
        let Some(mut detector) = checked_out else {
            self.slots.retire(permit, "permit granted without an idle instance");
            return Err(Self::closed());
        };

        let slots = Arc::clone(&self.slots);
        run_blocking(move || {
            match std::panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&image))) {
                Ok(result) => {
                    match slots.lock_idle() {
                        Ok(mut idle) => {
                            idle.push(detector);
                            drop(idle);
                            drop(permit);
                        }
                        Err(err) => slots.retire(permit, &err.to_string()),
                    }
                    result
                }
                Err(payload) => {
                    let message = panic_message(payload);
                    slots.retire(permit, &message);
                    Err(DetectorError::Panicked { message })
                }
            }
        })
        .await
    }

    async fn reset(&self) -> Result<(), DetectorError> {
        let live = self.live_instances();
        let count = u32::try_from(live).map_err(|_| DetectorError::Unavailable {
            message: format!("pool of {} instances too large to reset", live),
        })?;
        // 取得全部 permit，確保沒有實例正在使用
        let _all = self
            .slots
            .permits
            .acquire_many(count)
            .await
            .map_err(|_| Self::closed())?;
        for detector in self.slots.lock_idle()?.iter_mut() {
            detector.reset();
        }
        Ok(())
    }

    fn strategy_name(&self) -> &'static str {
        "pool"
    }
}

enum WorkerJob {
    Detect {
        image: RgbImage,
        reply: oneshot::Sender<Result<Detection, DetectorError>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

/// A dedicated thread that owns the detector; frames reach it by message.
///
/// Dropping every handle closes the channel and lets the thread exit.
pub struct DetectorWorker {
    sender: mpsc::Sender<WorkerJob>,
    thread: std::thread::JoinHandle<()>,
}

impl DetectorWorker {
    pub const QUEUE_DEPTH: usize = 16;

    pub fn spawn<D: PoseDetector>(mut detector: D) -> Result<Self, DetectorError> {
        let (sender, mut receiver) = mpsc::channel::<WorkerJob>(Self::QUEUE_DEPTH);

        let thread = std::thread::Builder::new()
            .name("pose-detector".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    match job {
                        WorkerJob::Detect { image, reply } => {
                            // 呼叫端可能已逾時離開，忽略回覆失敗
                            let _ = reply.send(detector.detect(&image));
                        }
                        WorkerJob::Reset { reply } => {
                            detector.reset();
                            let _ = reply.send(());
                        }
                    }
                }
                tracing::debug!("Detector worker channel closed, exiting");
            })
            .map_err(|e| DetectorError::Initialization {
                message: format!("failed to start detector worker: {}", e),
            })?;

        Ok(Self { sender, thread })
    }

    fn stopped() -> DetectorError {
        DetectorError::Unavailable {
            message: "detector worker stopped".to_string(),
        }
    }

    /// Closes the queue and waits for the worker thread. Blocks the caller.
    pub fn shutdown(self) -> Result<(), DetectorError> {
        let DetectorWorker { sender, thread } = self;
        drop(sender);
        thread.join().map_err(|payload| DetectorError::Panicked {
            message: panic_message(payload),
        })
    }
}

#[async_trait]
impl LandmarkSource for DetectorWorker {
    async fn detect(&self, image: RgbImage) -> Result<Detection, DetectorError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(WorkerJob::Detect { image, reply })
            .await
            .map_err(|_| Self::stopped())?;
        response.await.map_err(|_| Self::stopped())?
    }

    async fn reset(&self) -> Result<(), DetectorError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(WorkerJob::Reset { reply })
            .await
            .map_err(|_| Self::stopped())?;
        response.await.map_err(|_| Self::stopped())
    }

    fn strategy_name(&self) -> &'static str {
        "worker"
    }
}

/// Builds the landmark source named by `strategy` around instances from `factory`.
pub fn build_source<D: PoseDetector>(
    strategy: SharingStrategy,
    settings: DetectorSettings,
    pool_size: usize,
    factory: DetectorFactory<D>,
) -> Result<Arc<dyn LandmarkSource>, DetectorError> {
    if strategy != SharingStrategy::PerCall && settings.mode == DetectorMode::Static {
        tracing::debug!(
            "Static detector mode with {:?} strategy, instances are reused across frames",
            strategy
        );
    }

    let source: Arc<dyn LandmarkSource> = match strategy {
        SharingStrategy::Shared => Arc::new(SharedDetector::new(factory(&settings)?)),
        SharingStrategy::PerCall => Arc::new(PerCallDetector::new(factory, settings)),
        SharingStrategy::Pool => Arc::new(DetectorPool::from_factory(
            &factory, &settings, pool_size,
        )?),
        SharingStrategy::Worker => Arc::new(DetectorWorker::spawn(factory(&settings)?)?),
    };

    tracing::info!(
        "🦴 Landmark source ready: strategy={}, mode={:?}, model_complexity={}",
        source.strategy_name(),
        settings.mode,
        settings.model_complexity
    );
    Ok(source)
}
