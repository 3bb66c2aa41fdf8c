//! Showcase choreography.
//!
//! When a piece is clicked it glides to centre stage in front of the camera
//! and the remaining pieces are parked far behind it, out of the lit area.
//! While a piece holds the stage, a deep-scroll band slides it sideways out
//! of the frame.

use cgmath::Vector3;
use instant::Duration;

use crate::{scroll::map_range, tween::Tween};

/// Where a focused piece comes to rest, right in front of the camera.
pub const CENTRE_STAGE: Vector3<f32> = Vector3::new(0.0, 6.0, 10.0);

/// First parking spot for unfocused pieces, far behind the stage.
pub const CORNER_ORIGIN: Vector3<f32> = Vector3::new(190.0, 25.0, -280.0);

/// Parking spots fan out along x by this much per piece.
pub const CORNER_STRIDE: f32 = 30.0;

/// How long the glide to and from centre stage takes.
pub const FOCUS_DURATION: Duration = Duration::from_secs(4);

/// Scroll band in which the focused piece slides sideways.
pub const SLIDE_START: f64 = 4000.0;
pub const SLIDE_END: f64 = 4800.0;

/// How far the focused piece slides over the whole band.
pub const SLIDE_REACH: f64 = 15.0;

/// Target positions for every slot when `focused` takes the stage.
///
/// The focused slot goes to [`CENTRE_STAGE`]. The others are parked at
/// [`CORNER_ORIGIN`], fanned out in slot order so they never overlap.
pub fn slot_targets(focused: usize, count: usize) -> Vec<Vector3<f32>> {
    let mut parked = 0;
    (0..count)
        .map(|slot| {
            if slot == focused {
                CENTRE_STAGE
            } else {
                let target = CORNER_ORIGIN + Vector3::new(CORNER_STRIDE * parked as f32, 0.0, 0.0);
                parked += 1;
                target
            }
        })
        .collect()
}

/// The sideways offset of the focused piece for a page offset, if any.
///
/// Inside the band the offset maps linearly onto `[0, -SLIDE_REACH]`, both
/// ends inclusive. Outside the band the piece is left where it is.
pub fn slide_offset(scroll: f64) -> Option<f64> {
    if (SLIDE_START..=SLIDE_END).contains(&scroll) {
        Some(-map_range(scroll, SLIDE_START, SLIDE_END, 0.0, SLIDE_REACH))
    } else {
        None
    }
}

/// Tracks which piece holds the stage and drives the glides.
///
/// Refocusing mid-flight replaces all running tweens, so each piece glides
/// from wherever it currently is.
pub struct Staging {
    focused: Option<usize>,
    tweens: Vec<(usize, Tween)>,
}

impl Staging {
    pub fn new() -> Self {
        Self {
            focused: None,
            tweens: Vec::new(),
        }
    }

    /// Send slot `index` to centre stage and park the rest.
    ///
    /// `positions` holds the current position of every slot, in slot order.
    pub fn focus(&mut self, index: usize, positions: &[Vector3<f32>]) {
        self.focused = Some(index);
        let targets = slot_targets(index, positions.len());
        self.tweens = positions
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(slot, (position, target))| {
                (
                    slot,
                    Tween::new(*position, target, FOCUS_DURATION, simple_easing::expo_out),
                )
            })
            .collect();
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Step all glides by `dt` and return the slots that moved.
    pub fn advance(&mut self, dt: Duration) -> Vec<(usize, Vector3<f32>)> {
        let moved = self
            .tweens
            .iter_mut()
            .map(|(slot, tween)| (*slot, tween.advance(dt)))
            .collect();
        self.tweens.retain(|(_, tween)| !tween.finished());
        moved
    }
}

impl Default for Staging {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, vec3};

    use super::*;

    #[test]
    fn focused_slot_targets_centre_stage() {
        let targets = slot_targets(1, 3);
        assert_eq!(targets[1], CENTRE_STAGE);
    }

    #[test]
    fn parked_slots_fan_out_in_slot_order() {
        let targets = slot_targets(1, 3);
        assert_eq!(targets[0], vec3(190.0, 25.0, -280.0));
        assert_eq!(targets[2], vec3(220.0, 25.0, -280.0));

        // Selecting the first slot parks the other two instead
        let targets = slot_targets(0, 3);
        assert_eq!(targets[1], vec3(190.0, 25.0, -280.0));
        assert_eq!(targets[2], vec3(220.0, 25.0, -280.0));
    }

    #[test]
    fn slide_band_is_inclusive_on_both_ends() {
        assert_eq!(slide_offset(4000.0), Some(0.0));
        assert_eq!(slide_offset(4800.0), Some(-15.0));
        assert_eq!(slide_offset(4400.0), Some(-7.5));
        assert_eq!(slide_offset(3999.9), None);
        assert_eq!(slide_offset(4800.1), None);
        assert_eq!(slide_offset(0.0), None);
    }

    #[test]
    fn focus_glides_every_slot_to_its_target() {
        let mut staging = Staging::new();
        let positions = [
            vec3(0.0, 3.0, 0.0),
            vec3(-22.0, 0.0, 0.0),
            vec3(22.0, 0.0, 0.0),
        ];
        staging.focus(2, &positions);
        assert_eq!(staging.focused(), Some(2));

        let moved = staging.advance(FOCUS_DURATION);
        assert_eq!(moved.len(), 3);
        assert_eq!(moved[2], (2, CENTRE_STAGE));
        assert_eq!(moved[0].1, vec3(190.0, 25.0, -280.0));
        assert_eq!(moved[1].1, vec3(220.0, 25.0, -280.0));

        // Everything arrived, nothing left to animate
        assert!(staging.advance(Duration::from_millis(16)).is_empty());
    }

    #[test]
    fn refocusing_restarts_from_current_positions() {
        let mut staging = Staging::new();
        let positions = [vec3(-22.0, 0.0, 0.0), vec3(22.0, 0.0, 0.0)];
        staging.focus(0, &positions);
        let moved = staging.advance(Duration::from_secs(1));

        // Mid-flight switch to the other piece
        let current = [moved[0].1, moved[1].1];
        staging.focus(1, &current);
        assert_eq!(staging.focused(), Some(1));
        let arrived = staging.advance(FOCUS_DURATION);
        // The glides start from mid-flight floats, allow for rounding
        assert!((arrived[1].1 - CENTRE_STAGE).magnitude() < 1e-4);
        assert!((arrived[0].1 - CORNER_ORIGIN).magnitude() < 1e-4);
    }
}
