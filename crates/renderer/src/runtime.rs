use std::time::{Duration, Instant};

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock time in seconds since the loop started.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

/// Monotonic clock anchored to the first tick.
///
/// The origin is captured lazily on the first `sample` call, so the first
/// frame always observes 0.0 seconds regardless of how long startup took.
#[derive(Debug, Default)]
pub struct FrameClock {
    origin: Option<Instant>,
    frame: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the time sample for the next frame.
    pub fn sample(&mut self) -> TimeSample {
        let now = Instant::now();
        let origin = *self.origin.get_or_insert(now);
        let sample = TimeSample {
            seconds: now.duration_since(origin).as_secs_f32(),
            frame_index: self.frame,
        };
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Lifecycle of the per-frame driver.
///
/// `start` is only honoured from `Idle`, `stop` is terminal, and only
/// `Running` permits ticks. The window loop consults `is_running` before
/// every redraw, so once `stop` returns no further tick can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl LoopPhase {
    /// Transitions `Idle -> Running`. Any other state is left untouched.
    pub fn start(&mut self) -> bool {
        if *self == LoopPhase::Idle {
            *self = LoopPhase::Running;
            true
        } else {
            false
        }
    }

    /// Transitions into the terminal `Stopped` state.
    pub fn stop(&mut self) {
        *self = LoopPhase::Stopped;
    }

    pub fn is_running(&self) -> bool {
        *self == LoopPhase::Running
    }
}

/// Optional frame-rate cap layered over the redraw scheduling.
///
/// Without a target the pacer always reports ready and the environment's
/// vblank signal sets the cadence. With a target, `ready_for_frame` gates
/// redraw requests and `next_deadline` feeds `ControlFlow::WaitUntil`.
#[derive(Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    next_deadline: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            interval,
            next_deadline: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.interval, self.next_deadline) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(_), Some(deadline)) => now >= deadline,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        if let Some(interval) = self.interval {
            self.next_deadline = Some(now + interval);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.interval.and(self.next_deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_zero_and_never_goes_backwards() {
        let mut clock = FrameClock::new();
        let first = clock.sample();
        assert!(first.seconds.abs() < 1e-3);
        assert_eq!(first.frame_index, 0);

        let mut previous = first.seconds;
        for expected_frame in 1..5 {
            let sample = clock.sample();
            assert!(sample.seconds >= previous);
            assert_eq!(sample.frame_index, expected_frame);
            previous = sample.seconds;
        }
    }

    #[test]
    fn phase_walks_idle_running_stopped() {
        let mut phase = LoopPhase::default();
        assert_eq!(phase, LoopPhase::Idle);
        assert!(!phase.is_running());

        assert!(phase.start());
        assert!(phase.is_running());

        phase.stop();
        assert_eq!(phase, LoopPhase::Stopped);
        assert!(!phase.is_running());
    }

    #[test]
    fn stopped_phase_cannot_restart() {
        let mut phase = LoopPhase::Stopped;
        assert!(!phase.start());
        assert_eq!(phase, LoopPhase::Stopped);
    }

    #[test]
    fn uncapped_pacer_is_always_ready() {
        let mut pacer = FramePacer::new(None);
        let now = Instant::now();
        assert!(pacer.ready_for_frame(now));
        pacer.mark_rendered(now);
        assert!(pacer.ready_for_frame(now));
        assert_eq!(pacer.next_deadline(), None);
    }

    #[test]
    fn capped_pacer_waits_out_the_interval() {
        let mut pacer = FramePacer::new(Some(10.0));
        let now = Instant::now();
        assert!(pacer.ready_for_frame(now));

        pacer.mark_rendered(now);
        assert!(!pacer.ready_for_frame(now));
        let deadline = pacer.next_deadline().expect("deadline after a frame");
        assert!(pacer.ready_for_frame(deadline));
    }

    #[test]
    fn non_positive_fps_means_uncapped() {
        let pacer = FramePacer::new(Some(0.0));
        assert!(pacer.next_deadline().is_none());
        assert!(pacer.ready_for_frame(Instant::now()));
    }
}
