//! Time-based position animation.

use cgmath::{Vector3, VectorSpace};
use instant::Duration;

/// Animates a position from one point to another over a fixed duration.
///
/// The easing curve maps normalized time in `[0, 1]` to an interpolation
/// factor, so any of the `simple_easing` functions can be plugged in
/// directly. Advancing past the end clamps to the target.
pub struct Tween {
    from: Vector3<f32>,
    to: Vector3<f32>,
    duration: Duration,
    elapsed: Duration,
    curve: fn(f32) -> f32,
}

impl Tween {
    pub fn new(
        from: Vector3<f32>,
        to: Vector3<f32>,
        duration: Duration,
        curve: fn(f32) -> f32,
    ) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            curve,
        }
    }

    /// Advance by `dt` and return the current position.
    pub fn advance(&mut self, dt: Duration) -> Vector3<f32> {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f32() / self.duration.as_secs_f32()
        };
        self.from.lerp(self.to, (self.curve)(t))
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use cgmath::vec3;

    use super::*;

    #[test]
    fn starts_at_from_and_ends_at_to() {
        let mut tween = Tween::new(
            vec3(0.0, 0.0, 0.0),
            vec3(10.0, 0.0, 0.0),
            Duration::from_secs(4),
            simple_easing::expo_out,
        );
        assert_eq!(tween.advance(Duration::ZERO), vec3(0.0, 0.0, 0.0));
        assert!(!tween.finished());
        assert_eq!(tween.advance(Duration::from_secs(4)), vec3(10.0, 0.0, 0.0));
        assert!(tween.finished());
    }

    #[test]
    fn exponential_ease_covers_most_of_the_distance_early() {
        let mut tween = Tween::new(
            vec3(0.0, 0.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            Duration::from_secs(4),
            simple_easing::expo_out,
        );
        // expo_out(0.5) = 1 - 2^-5
        let halfway = tween.advance(Duration::from_secs(2));
        assert!((halfway.x - 0.96875).abs() < 1e-6);
    }

    #[test]
    fn advancing_past_the_end_clamps_to_the_target() {
        let mut tween = Tween::new(
            vec3(1.0, 2.0, 3.0),
            vec3(4.0, 5.0, 6.0),
            Duration::from_secs(1),
            simple_easing::linear,
        );
        tween.advance(Duration::from_secs(10));
        assert!(tween.finished());
        assert_eq!(tween.advance(Duration::from_secs(1)), vec3(4.0, 5.0, 6.0));
    }

    #[test]
    fn a_zero_duration_tween_is_finished_immediately() {
        let mut tween = Tween::new(
            vec3(0.0, 0.0, 0.0),
            vec3(7.0, 0.0, 0.0),
            Duration::ZERO,
            simple_easing::expo_out,
        );
        assert_eq!(tween.advance(Duration::ZERO), vec3(7.0, 0.0, 0.0));
        assert!(tween.finished());
    }
}
