// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rolling frame statistics recorded by the render loop.

use std::time::Duration;

/// Number of frame intervals kept for averages (4 s at 30 fps).
pub const INTERVAL_WINDOW: usize = 120;

/// The most recent frame intervals, in milliseconds.
///
/// Holds up to `N` intervals; once full, each new interval evicts the oldest.
#[derive(Debug, Clone)]
pub struct IntervalWindow<const N: usize = INTERVAL_WINDOW> {
    intervals_ms: [f32; N],
    next: usize,
    len: usize,
}

impl<const N: usize> IntervalWindow<N> {
    /// Creates a window with no intervals.
    pub fn new() -> Self {
        Self {
            intervals_ms: [0.0; N],
            next: 0,
            len: 0,
        }
    }

    /// Records the time between two consecutive frame starts.
    pub fn record(&mut self, interval: Duration) {
        self.intervals_ms[self.next] = interval.as_secs_f32() * 1000.0;
        self.next = (self.next + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    /// Returns how many intervals the window currently holds.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` before the first interval is recorded.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the held intervals, oldest first.
    pub fn iter_ms(&self) -> impl Iterator<Item = f32> + '_ {
        // Before the first wrap the slots past `next` were never written.
        let oldest = if self.len < N { 0 } else { self.next };
        (0..self.len).map(move |i| self.intervals_ms[(oldest + i) % N])
    }

    /// Mean interval in milliseconds, `0.0` when empty.
    pub fn mean_ms(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.iter_ms().sum::<f32>() / self.len as f32
    }

    /// Standard deviation of the intervals in milliseconds.
    ///
    /// Zero means perfectly even pacing.
    pub fn jitter_ms(&self) -> f32 {
        if self.len < 2 {
            return 0.0;
        }
        let mean = self.mean_ms();
        let spread: f32 = self.iter_ms().map(|v| (v - mean) * (v - mean)).sum();
        (spread / self.len as f32).sqrt()
    }

    /// Longest interval in milliseconds, `0.0` when empty.
    pub fn worst_ms(&self) -> f32 {
        self.iter_ms().fold(0.0, f32::max)
    }
}

impl<const N: usize> Default for IntervalWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// What one frame did, as counted by the render loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Targets painted successfully.
    pub painted: usize,
    /// Targets skipped because they were not displayable.
    pub skipped: usize,
    /// Targets whose paint failed or panicked.
    pub failed: usize,
}

/// A point-in-time summary of the render loop's behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frames run since the scheduler started.
    pub frames: u64,
    /// Successful paints since the scheduler started.
    pub paints: u64,
    /// Failed or panicked paints since the scheduler started.
    pub paint_failures: u64,
    /// Frames whose body panicked outside of any paint call.
    pub frame_panics: u64,
    /// Mean interval between frame starts over the recent window.
    pub mean_interval: Duration,
    /// Longest recent interval between frame starts.
    pub worst_interval: Duration,
    /// Standard deviation of recent intervals, in milliseconds.
    pub jitter_ms: f32,
}

impl FrameStats {
    /// Returns the frame rate implied by the mean interval, or `0.0` before
    /// any interval was measured.
    pub fn measured_fps(&self) -> f32 {
        if self.mean_interval.is_zero() {
            0.0
        } else {
            1.0 / self.mean_interval.as_secs_f32()
        }
    }
}

/// Accumulates per-frame measurements on the render thread.
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    intervals: IntervalWindow,
    frames: u64,
    paints: u64,
    paint_failures: u64,
    frame_panics: u64,
}

impl FrameMetrics {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the interval between the starts of two consecutive frames.
    pub fn record_interval(&mut self, interval: Duration) {
        self.intervals.record(interval);
    }

    /// Records a completed frame.
    pub fn record_frame(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.paints += report.painted as u64;
        self.paint_failures += report.failed as u64;
    }

    /// Records a frame whose body panicked.
    pub fn record_panic(&mut self) {
        self.frames += 1;
        self.frame_panics += 1;
    }

    /// Summarizes everything recorded so far.
    pub fn snapshot(&self) -> FrameStats {
        let to_duration = |ms: f32| Duration::from_secs_f32(ms.max(0.0) / 1000.0);
        FrameStats {
            frames: self.frames,
            paints: self.paints,
            paint_failures: self.paint_failures,
            frame_panics: self.frame_panics,
            mean_interval: to_duration(self.intervals.mean_ms()),
            worst_interval: to_duration(self.intervals.worst_ms()),
            jitter_ms: self.intervals.jitter_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_window_keeps_the_latest_intervals() {
        let mut window = IntervalWindow::<3>::new();
        window.record(ms(10));
        window.record(ms(20));
        assert_eq!(window.iter_ms().map(f32::round).collect::<Vec<_>>(), vec![10.0, 20.0]);

        window.record(ms(30));
        window.record(ms(40)); // evicts 10 ms
        assert_eq!(window.iter_ms().map(f32::round).collect::<Vec<_>>(), vec![20.0, 30.0, 40.0]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_window_mean_jitter_and_worst() {
        let mut window = IntervalWindow::<4>::new();
        assert_eq!(window.mean_ms(), 0.0);
        assert_eq!(window.worst_ms(), 0.0);

        window.record(ms(10));
        assert_eq!(window.jitter_ms(), 0.0);
        window.record(ms(20));
        window.record(ms(30));
        assert!((window.mean_ms() - 20.0).abs() < 1e-3);
        assert!((window.jitter_ms() - (200.0f32 / 3.0).sqrt()).abs() < 1e-3);
        assert!((window.worst_ms() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_frame_metrics_snapshot() {
        let mut metrics = FrameMetrics::new();
        metrics.record_interval(Duration::from_millis(20));
        metrics.record_interval(Duration::from_millis(20));
        metrics.record_frame(&FrameReport {
            painted: 2,
            skipped: 1,
            failed: 1,
        });
        metrics.record_panic();

        let stats = metrics.snapshot();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.paints, 2);
        assert_eq!(stats.paint_failures, 1);
        assert_eq!(stats.frame_panics, 1);
        assert!((stats.measured_fps() - 50.0).abs() < 0.5);
        assert!(stats.jitter_ms < 0.01);
    }

    #[test]
    fn test_empty_stats_have_no_rate() {
        let stats = FrameMetrics::new().snapshot();
        assert_eq!(stats.measured_fps(), 0.0);
        assert_eq!(stats.mean_interval, Duration::ZERO);
    }
}
