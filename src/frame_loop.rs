// frame_loop.rs — the continuously rescheduled render task
//
// The loop is driven by ticks (display refresh in the app, a counter in
// tests) and stops for good once its token is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::Camera;
use crate::hotspots::HotspotLayout;
use crate::session::{FrameReport, PanoramaSession, SphereState};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub trait TickSource {
    /// Timestamp of the next frame, or `None` when the source is exhausted.
    fn next_tick(&mut self) -> Option<Instant>;
}

/// A fixed number of evenly spaced ticks.
#[derive(Debug, Clone)]
pub struct FixedTicks {
    remaining: usize,
    now: Instant,
    step: Duration,
}

impl FixedTicks {
    pub fn new(count: usize, step: Duration) -> Self {
        Self {
            remaining: count,
            now: Instant::now(),
            step,
        }
    }
}

impl TickSource for FixedTicks {
    fn next_tick(&mut self) -> Option<Instant> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.now += self.step;
        Some(self.now)
    }
}

/// Receives each frame's output.
pub trait FrameSink {
    fn render(&mut self, camera: &Camera, sphere: &SphereState);
    fn place_hotspots(&mut self, _layout: &HotspotLayout) {}
    fn fov_changed(&mut self, _fov: f32) {}
}

#[derive(Debug)]
pub struct FrameLoop {
    token: CancellationToken,
    frames: u64,
    window_start: Option<Instant>,
    window_frames: u32,
    fps: f32,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            frames: 0,
            window_start: None,
            window_frames: 0,
            fps: 0.0,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second over the last full one-second window.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Run one frame. Returns `None` once the loop was stopped.
    pub fn step(
        &mut self,
        now: Instant,
        session: &mut PanoramaSession,
        sink: &mut dyn FrameSink,
    ) -> Option<FrameReport> {
        if self.token.is_cancelled() {
            return None;
        }

        session.begin_frame();
        sink.render(session.camera(), session.sphere());
        let report = session.end_frame();
        sink.place_hotspots(session.layout());
        if let Some(fov) = report.fov_changed {
            sink.fov_changed(fov);
        }

        self.frames += 1;
        self.count_fps(now);
        Some(report)
    }

    /// Drive frames until the source runs dry or the token is cancelled.
    /// Returns the number of frames run.
    pub fn run(
        &mut self,
        ticks: &mut dyn TickSource,
        session: &mut PanoramaSession,
        sink: &mut dyn FrameSink,
    ) -> u64 {
        let start = self.frames;
        while let Some(now) = ticks.next_tick() {
            if self.step(now, session, sink).is_none() {
                break;
            }
        }
        self.frames - start
    }

    fn count_fps(&mut self, now: Instant) {
        let start = *self.window_start.get_or_insert(now);
        self.window_frames += 1;
        let elapsed = now.duration_since(start).as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.window_frames as f32 / elapsed;
            self.window_frames = 0;
            self.window_start = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::projector::Viewport;

    #[derive(Default)]
    struct Recorder {
        renders: usize,
        layouts: usize,
        fovs: Vec<f32>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl FrameSink for Recorder {
        fn render(&mut self, _camera: &Camera, _sphere: &SphereState) {
            self.renders += 1;
        }
        fn place_hotspots(&mut self, _layout: &HotspotLayout) {
            self.layouts += 1;
            if let Some((n, token)) = &self.cancel_after {
                if self.layouts >= *n {
                    token.cancel();
                }
            }
        }
        fn fov_changed(&mut self, fov: f32) {
            self.fovs.push(fov);
        }
    }

    fn session() -> PanoramaSession {
        PanoramaSession::viewer(ViewerConfig::default(), Viewport::new(640.0, 480.0))
    }

    #[test]
    fn runs_exactly_n_ticks() {
        let mut lp = FrameLoop::new();
        let mut s = session();
        let mut rec = Recorder::default();
        let ran = lp.run(&mut FixedTicks::new(5, Duration::from_millis(16)), &mut s, &mut rec);
        assert_eq!(ran, 5);
        assert_eq!(rec.renders, 5);
        assert_eq!(rec.layouts, 5);
    }

    #[test]
    fn cancel_stops_mid_run() {
        let mut lp = FrameLoop::new();
        let mut s = session();
        let mut rec = Recorder {
            cancel_after: Some((3, lp.token())),
            ..Default::default()
        };
        let ran = lp.run(&mut FixedTicks::new(100, Duration::from_millis(16)), &mut s, &mut rec);
        assert_eq!(ran, 3);
        assert!(!lp.is_running());
        assert!(lp.step(Instant::now(), &mut s, &mut rec).is_none());
    }

    #[test]
    fn fps_over_one_second() {
        let mut lp = FrameLoop::new();
        let mut s = session();
        let mut rec = Recorder::default();
        lp.run(&mut FixedTicks::new(61, Duration::from_millis(20)), &mut s, &mut rec);
        assert!(lp.fps() > 45.0 && lp.fps() < 55.0);
    }

    #[test]
    fn fov_listener_sees_changes_only() {
        let mut lp = FrameLoop::new();
        let mut s = session();
        let mut rec = Recorder::default();
        lp.run(&mut FixedTicks::new(3, Duration::from_millis(16)), &mut s, &mut rec);
        s.apply_wheel_delta(100.0);
        lp.run(&mut FixedTicks::new(3, Duration::from_millis(16)), &mut s, &mut rec);
        assert_eq!(rec.fovs, vec![80.0]);
    }
}
