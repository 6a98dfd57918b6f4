//! Frame timing statistics

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Longest history kept, seconds.
const HISTORY_SECS: f64 = 15.0;

/// FPS statistics for a time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FpsWindow {
    pub avg: f32,
    pub min: f32,
    pub max: f32,
}

/// Rolling FPS statistics over multiple time windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FpsStats {
    pub one_sec: FpsWindow,
    pub five_sec: FpsWindow,
    pub fifteen_sec: FpsWindow,
    pub current_fps: f32,
    pub frame_count: u64,
    /// Frames the throttle dropped.
    pub skipped_frames: u64,
}

/// Tracks rendered frame times on the scheduler's clock.
///
/// Timestamps come from the frame scheduler rather than the wall clock so
/// stepped runs produce the same numbers as real ones.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    last_frame: Option<f64>,
    delta: f64,
    frame_count: u64,
    skipped: u64,
    fps_timer: f64,
    fps: f32,
    fps_frame_count: u32,
    /// (timestamp, frame_time_secs)
    frame_history: VecDeque<(f64, f32)>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rendered frame at `now` (seconds). Returns the delta since
    /// the previous rendered frame, 0 for the first.
    pub fn record(&mut self, now: f64) -> f64 {
        let delta = match self.last_frame {
            Some(last) => (now - last).max(0.0),
            None => {
                self.fps_timer = now;
                0.0
            }
        };
        self.delta = delta;
        self.last_frame = Some(now);
        self.frame_count += 1;
        self.fps_frame_count += 1;

        if delta > 0.0 {
            self.frame_history.push_back((now, delta as f32));
        }
        let cutoff = now - HISTORY_SECS;
        while let Some(&(timestamp, _)) = self.frame_history.front() {
            if timestamp < cutoff {
                self.frame_history.pop_front();
            } else {
                break;
            }
        }

        // Update FPS every second
        let fps_elapsed = now - self.fps_timer;
        if fps_elapsed >= 1.0 {
            self.fps = (self.fps_frame_count as f64 / fps_elapsed) as f32;
            self.fps_frame_count = 0;
            self.fps_timer = now;
        }
        delta
    }

    /// Count a frame callback that was throttled away.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Forget the previous frame so the next delta starts from zero.
    pub fn reset_clock(&mut self) {
        self.last_frame = None;
        self.fps_frame_count = 0;
    }

    pub fn last_frame(&self) -> Option<f64> {
        self.last_frame
    }

    pub fn delta_secs(&self) -> f64 {
        self.delta
    }

    /// FPS over the last full second
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }

    /// Rolling FPS statistics over 1s, 5s, and 15s windows ending at the
    /// last recorded frame.
    pub fn fps_stats(&self) -> FpsStats {
        let now = self.last_frame.unwrap_or(0.0);
        FpsStats {
            one_sec: self.window(now, 1.0),
            five_sec: self.window(now, 5.0),
            fifteen_sec: self.window(now, 15.0),
            current_fps: self.fps,
            frame_count: self.frame_count,
            skipped_frames: self.skipped,
        }
    }

    fn window(&self, now: f64, window: f64) -> FpsWindow {
        let cutoff = now - window;
        let mut frames = 0;
        let mut total_time = 0.0f32;
        let mut min_fps = f32::INFINITY;
        let mut max_fps = 0.0f32;

        for &(_, frame_time) in self.frame_history.iter().filter(|(t, _)| *t > cutoff) {
            frames += 1;
            total_time += frame_time;
            let fps = if frame_time > 0.0 { 1.0 / frame_time } else { 0.0 };
            min_fps = min_fps.min(fps);
            max_fps = max_fps.max(fps);
        }

        if frames == 0 {
            return FpsWindow::default();
        }
        FpsWindow {
            avg: if total_time > 0.0 { frames as f32 / total_time } else { 0.0 },
            min: min_fps,
            max: max_fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_rate() {
        let mut stats = FrameStats::new();
        for i in 0..=90 {
            stats.record(i as f64 / 30.0);
        }
        assert_eq!(stats.frame_count(), 91);
        assert!((stats.delta_secs() - 1.0 / 30.0).abs() < 1e-9);
        let s = stats.fps_stats();
        assert!((s.one_sec.avg - 30.0).abs() < 0.5, "{:?}", s.one_sec);
        assert!((s.fifteen_sec.avg - s.five_sec.avg).abs() < 1e-3);
        assert!((stats.fps() - 30.0).abs() < 1.0);
    }

    #[test]
    fn test_min_max_track_hitches() {
        let mut stats = FrameStats::new();
        let mut t = 0.0;
        for i in 0..60 {
            t += if i == 30 { 0.25 } else { 1.0 / 60.0 };
            stats.record(t);
        }
        let s = stats.fps_stats().five_sec;
        assert!(s.min <= 4.0 + 1e-3);
        assert!((s.max - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_first_frame_and_reset() {
        let mut stats = FrameStats::new();
        assert_eq!(stats.record(10.0), 0.0);
        assert!((stats.record(10.5) - 0.5).abs() < 1e-12);
        stats.reset_clock();
        assert_eq!(stats.record(20.0), 0.0);
        stats.record_skip();
        assert_eq!(stats.fps_stats().skipped_frames, 1);
    }
}
