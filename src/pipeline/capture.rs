//! Frame-stability sampling for the capture surface.
//!
//! On every tick the sampler pulls a small patch from the frame center and
//! compares it against the previous tick's patch with a coarse strided
//! absolute-difference metric. Enough consecutive quiet ticks assert
//! "stable". The signal is purely advisory: the shutter works either way,
//! it only changes presentation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::models::RawCapture;
use crate::pipeline::IntakeError;

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

/// Side of the square center patch sampled per tick.
pub const PATCH_SIZE: u32 = 60;

/// Only every 16th sample of the patch is compared; coarse but cheap.
const SAMPLE_STRIDE: usize = 16;

/// Summed absolute difference below this counts as a quiet tick.
const DIFF_THRESHOLD: u64 = 350_000;

/// Quiet ticks required before the sampler asserts stability.
const STABLE_TICKS: u32 = 15;

/// Default cadence of the background sampling loop (~60 fps).
const DEFAULT_TICK: Duration = Duration::from_millis(16);

// ──────────────────────────────────────────────
// FrameSource
// ──────────────────────────────────────────────

/// Live video frame source behind the capture surface.
///
/// Implementations wrap the actual camera; tests use synthetic sequences.
pub trait FrameSource: Send {
    /// Raw samples (RGBA order) of a centered `size`×`size` patch of the
    /// current frame, or `None` while no frame is readable yet.
    fn sample_patch(&mut self, size: u32) -> Option<Vec<u8>>;

    /// Grab a full-resolution still. Advisory stability never gates this.
    fn capture_frame(&mut self) -> Result<RawCapture, IntakeError>;

    /// Release the underlying media resources. Must be idempotent; called
    /// on every exit path, including error exits.
    fn release(&mut self);
}

// ──────────────────────────────────────────────
// StabilitySampler
// ──────────────────────────────────────────────

/// Consecutive-quiet-tick detector over a frame source.
#[derive(Debug, Default)]
pub struct StabilitySampler {
    last_patch: Option<Vec<u8>>,
    quiet_ticks: u32,
    stable: bool,
}

impl StabilitySampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one tick. Returns the stability verdict after this tick.
    ///
    /// An unreadable frame (`None` patch) skips the tick entirely; the
    /// counter is neither advanced nor reset.
    pub fn tick(&mut self, source: &mut dyn FrameSource) -> bool {
        let Some(patch) = source.sample_patch(PATCH_SIZE) else {
            return self.stable;
        };
        self.observe(patch);
        self.stable
    }

    fn observe(&mut self, patch: Vec<u8>) {
        if let Some(previous) = &self.last_patch {
            if strided_abs_diff(previous, &patch) < DIFF_THRESHOLD {
                self.quiet_ticks += 1;
                if self.quiet_ticks > STABLE_TICKS {
                    self.stable = true;
                }
            } else {
                self.quiet_ticks = 0;
                self.stable = false;
            }
        }
        self.last_patch = Some(patch);
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }
}

/// Coarse motion metric: summed absolute difference over a fixed sampling
/// stride, not every sample.
fn strided_abs_diff(previous: &[u8], current: &[u8]) -> u64 {
    previous
        .iter()
        .zip(current)
        .step_by(SAMPLE_STRIDE)
        .map(|(&a, &b)| u64::from(a.abs_diff(b)))
        .sum()
}

// ──────────────────────────────────────────────
// Background sampling loop
// ──────────────────────────────────────────────

/// Handle to a running stability loop. Publishes the advisory flag and
/// stops-and-joins the loop on drop, so sampling never outlives the capture
/// surface.
pub struct StabilityHandle {
    stable: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl StabilityHandle {
    pub fn is_stable(&self) -> bool {
        self.stable.load(Ordering::Relaxed)
    }

    /// Cancel the loop and wait for it to exit.
    pub fn cancel(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for StabilityHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn the periodic sampling loop over a shared frame source.
///
/// The source is shared with the capture path (shutter) through the mutex;
/// each tick holds the lock only long enough to read one patch.
pub fn spawn_stability_loop<S: FrameSource + 'static>(
    source: Arc<Mutex<S>>,
    tick: Option<Duration>,
) -> StabilityHandle {
    let tick = tick.unwrap_or(DEFAULT_TICK);
    let stable = Arc::new(AtomicBool::new(false));
    let stop = Arc::new(AtomicBool::new(false));

    let stable_flag = Arc::clone(&stable);
    let stop_flag = Arc::clone(&stop);
    let join = std::thread::spawn(move || {
        let mut sampler = StabilitySampler::new();
        tracing::debug!(tick_ms = tick.as_millis() as u64, "stability loop started");
        while !stop_flag.load(Ordering::Relaxed) {
            if let Ok(mut source) = source.lock() {
                let verdict = sampler.tick(&mut *source);
                stable_flag.store(verdict, Ordering::Relaxed);
            }
            std::thread::sleep(tick);
        }
        tracing::debug!("stability loop cancelled");
    });

    StabilityHandle {
        stable,
        stop,
        join: Some(join),
    }
}
