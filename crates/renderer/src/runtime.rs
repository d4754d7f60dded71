use std::path::PathBuf;
use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Evaluate the smoke at a fixed timestamp and write a PNG.
    Export {
        /// Timestamp to evaluate the shader at (seconds).
        time: f32,
        /// Destination path for the exported file.
        path: PathBuf,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
}

impl TimeSample {
    pub fn new(seconds: f32) -> Self {
        Self { seconds }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource {
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock. Never reset.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(origin: Instant) -> Self {
        Self { origin }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.origin.elapsed().as_secs_f32())
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
}

impl FixedTimeSource {
    pub fn new(time: f32) -> Self {
        Self { time }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.time)
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(SystemTimeSource::new()),
        RenderPolicy::Export { time, .. } => Box::new(FixedTimeSource::new(*time)),
    }
}

/// Paces redraws when an FPS cap is requested.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok());
        Self {
            interval,
            last: None,
        }
    }

    pub fn is_capped(&self) -> bool {
        self.interval.is_some()
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.interval, self.last) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            _ => true,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// Deadline for the next capped frame, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        let interval = self.interval?;
        let last = self.last?;
        let deadline = last.checked_add(interval)?;
        tracing::trace!(
            interval_ms = interval.as_secs_f32() * 1000.0,
            "next frame deadline scheduled"
        );
        Some(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_source_is_stable() {
        let mut source = FixedTimeSource::new(4.5);
        assert_eq!(source.sample().seconds, 4.5);
        assert_eq!(source.sample().seconds, 4.5);
    }

    #[test]
    fn system_time_source_is_monotonic() {
        let mut source = SystemTimeSource::starting_at(Instant::now());
        let first = source.sample();
        let second = source.sample();
        assert!(second.seconds >= first.seconds);
    }

    #[test]
    fn export_policy_uses_fixed_time() {
        let policy = RenderPolicy::Export {
            time: 2.0,
            path: PathBuf::from("still.png"),
        };
        let mut source = time_source_for_policy(&policy);
        assert_eq!(source.sample().seconds, 2.0);
    }

    #[test]
    fn uncapped_scheduler_is_always_ready() {
        let mut scheduler = FrameScheduler::new(None);
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn capped_scheduler_waits_for_interval() {
        let mut scheduler = FrameScheduler::new(Some(4.0));
        assert!(scheduler.is_capped());
        let start = Instant::now();
        scheduler.mark_rendered(start);
        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(100)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(250)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(250))
        );
    }

    #[test]
    fn nonsensical_caps_are_ignored() {
        assert!(!FrameScheduler::new(Some(0.0)).is_capped());
        assert!(!FrameScheduler::new(Some(f32::NAN)).is_capped());
        assert!(!FrameScheduler::new(Some(-30.0)).is_capped());
    }

    #[test]
    fn caps_too_slow_to_schedule_are_ignored() {
        let mut scheduler = FrameScheduler::new(Some(1e-30));
        assert!(!scheduler.is_capped());
        let now = Instant::now();
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());

        assert!(FrameScheduler::new(Some(1e-6)).is_capped());
    }
}
