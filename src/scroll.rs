//! Scroll input tracking.
//!
//! Wheel events arrive as deltas, but the showcase logic wants an absolute
//! page offset (like a browser's `scrollY`) plus the speed at which it moves.
//! [`ScrollFeed`] integrates the deltas into a clamped offset and measures the
//! speed with a [`SpeedSampler`], and [`Spin`] turns that speed into a decaying
//! angular velocity.

use instant::{Duration, Instant};

/// Wheel line-deltas are scaled by this many pixels per line.
pub const PIXELS_PER_LINE: f64 = 100.0;

/// Total scrollable length of the virtual page in pixels.
pub const PAGE_LENGTH: f64 = 6000.0;

/// A sampler that has seen no input for this long starts over.
pub(crate) const SAMPLE_TIMEOUT: Duration = Duration::from_millis(50);

const DECAY_FACTOR: f64 = 0.99;
const MIN_VELOCITY: f64 = 0.00001;

/// Linearly remaps `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// Values outside the input range extrapolate. A degenerate input range maps
/// everything to `out_min`.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Measures how fast a position changes between samples.
///
/// The first sample after a reset reports zero speed since there is nothing
/// to compare against. A gap of [`SAMPLE_TIMEOUT`] or more between samples
/// resets the sampler, so a fresh burst of scrolling never compares against a
/// stale position.
pub struct SpeedSampler {
    last_position: Option<f64>,
    delta: f64,
    last_sample: Option<Instant>,
}

impl SpeedSampler {
    pub fn new() -> Self {
        Self {
            last_position: None,
            delta: 0.0,
            last_sample: None,
        }
    }

    /// Record `position` and return the delta to the previous sample.
    pub fn sample(&mut self, position: f64) -> f64 {
        self.sample_at(position, Instant::now())
    }

    fn sample_at(&mut self, position: f64, now: Instant) -> f64 {
        if let Some(last_sample) = self.last_sample {
            if now.duration_since(last_sample) >= SAMPLE_TIMEOUT {
                self.clear();
            }
        }
        if let Some(last_position) = self.last_position {
            self.delta = position - last_position;
        }
        self.last_position = Some(position);
        self.last_sample = Some(now);
        self.delta
    }

    pub fn clear(&mut self) {
        self.last_position = None;
        self.delta = 0.0;
        self.last_sample = None;
    }
}

impl Default for SpeedSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Integrates wheel deltas into an absolute page offset.
pub struct ScrollFeed {
    offset: f64,
    sampler: SpeedSampler,
}

impl ScrollFeed {
    pub fn new() -> Self {
        Self {
            offset: 0.0,
            sampler: SpeedSampler::new(),
        }
    }

    /// Apply a wheel delta in pixels and return the measured scroll speed.
    ///
    /// The offset is clamped to `[0, PAGE_LENGTH]`, so holding the wheel at
    /// either end reports a speed of zero once the edge is reached.
    pub fn apply_wheel(&mut self, delta_px: f64) -> f64 {
        self.offset = (self.offset + delta_px).clamp(0.0, PAGE_LENGTH);
        self.sampler.sample(self.offset)
    }

    /// Current page offset in pixels.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Jump back to the top of the page, like a `scrollTo(0, 0)`.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.sampler.clear();
    }
}

impl Default for ScrollFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// An angular velocity that bleeds off a little every frame.
///
/// Each [`decay`](Self::decay) call scales the velocity by `0.99` until it
/// drops below a threshold, at which point it snaps to zero so a spinning
/// object eventually comes to a complete rest.
pub struct Spin {
    velocity: f64,
}

impl Spin {
    pub fn new() -> Self {
        Self { velocity: 0.0 }
    }

    pub fn set(&mut self, velocity: f64) {
        self.velocity = velocity;
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn decay(&mut self) {
        if self.velocity.abs() > MIN_VELOCITY {
            self.velocity *= DECAY_FACTOR;
        } else {
            self.velocity = 0.0;
        }
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_range_hits_both_endpoints() {
        assert_eq!(map_range(4000.0, 4000.0, 4800.0, 0.0, 15.0), 0.0);
        assert_eq!(map_range(4800.0, 4000.0, 4800.0, 0.0, 15.0), 15.0);
    }

    #[test]
    fn map_range_is_affine_in_between() {
        assert_eq!(map_range(4400.0, 4000.0, 4800.0, 0.0, 15.0), 7.5);
        assert_eq!(map_range(0.5, 0.0, 1.0, -10.0, 10.0), 0.0);
    }

    #[test]
    fn map_range_extrapolates_outside_the_input_range() {
        assert_eq!(map_range(2.0, 0.0, 1.0, 0.0, 10.0), 20.0);
        assert_eq!(map_range(-1.0, 0.0, 1.0, 0.0, 10.0), -10.0);
    }

    #[test]
    fn map_range_with_degenerate_input_returns_out_min() {
        assert_eq!(map_range(123.0, 5.0, 5.0, 1.0, 9.0), 1.0);
    }

    #[test]
    fn first_sample_reports_zero_speed() {
        let mut sampler = SpeedSampler::new();
        assert_eq!(sampler.sample_at(300.0, Instant::now()), 0.0);
    }

    #[test]
    fn consecutive_samples_report_the_position_delta() {
        let mut sampler = SpeedSampler::new();
        let t0 = Instant::now();
        sampler.sample_at(100.0, t0);
        assert_eq!(sampler.sample_at(160.0, t0 + Duration::from_millis(16)), 60.0);
        assert_eq!(sampler.sample_at(130.0, t0 + Duration::from_millis(32)), -30.0);
    }

    #[test]
    fn a_long_pause_resets_the_sampler() {
        let mut sampler = SpeedSampler::new();
        let t0 = Instant::now();
        sampler.sample_at(100.0, t0);
        sampler.sample_at(200.0, t0 + Duration::from_millis(16));
        // 50ms without input, the next sample starts a new burst
        assert_eq!(sampler.sample_at(900.0, t0 + Duration::from_millis(80)), 0.0);
        assert_eq!(
            sampler.sample_at(950.0, t0 + Duration::from_millis(96)),
            50.0
        );
    }

    #[test]
    fn feed_clamps_to_the_page() {
        let mut feed = ScrollFeed::new();
        feed.apply_wheel(-500.0);
        assert_eq!(feed.offset(), 0.0);
        feed.apply_wheel(PAGE_LENGTH + 1000.0);
        assert_eq!(feed.offset(), PAGE_LENGTH);
        feed.reset();
        assert_eq!(feed.offset(), 0.0);
    }

    #[test]
    fn feed_speed_is_zero_while_pinned_to_an_edge() {
        let mut feed = ScrollFeed::new();
        feed.apply_wheel(PAGE_LENGTH);
        assert_eq!(feed.apply_wheel(300.0), 0.0);
    }

    #[test]
    fn spin_decays_geometrically() {
        let mut spin = Spin::new();
        spin.set(1.0);
        spin.decay();
        assert!((spin.velocity() - 0.99).abs() < 1e-12);
        spin.decay();
        assert!((spin.velocity() - 0.9801).abs() < 1e-12);
    }

    #[test]
    fn spin_snaps_to_zero_below_the_threshold() {
        let mut spin = Spin::new();
        spin.set(0.000009);
        spin.decay();
        assert_eq!(spin.velocity(), 0.0);
    }
}
