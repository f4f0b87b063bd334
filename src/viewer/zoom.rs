//! Zoom state for the page view
//!
//! The factor is a presentation multiplier only: it scales the painted
//! surface and every overlay, never the decoded pixels.

/// Zoom state for page viewing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: Self::DEFAULT_SCALE,
        }
    }
}

impl Zoom {
    /// Factor change per zoom step
    pub const STEP: f32 = 0.25;
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f32 = 0.25;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f32 = 5.0;
    /// Factor restored by [`Zoom::reset`]
    pub const DEFAULT_SCALE: f32 = 1.0;

    /// Returns the current zoom factor
    #[must_use]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom in by one step
    pub fn step_in(&mut self) {
        self.factor = Self::clamp_factor(self.factor + Self::STEP);
    }

    /// Zoom out by one step
    pub fn step_out(&mut self) {
        self.factor = Self::clamp_factor(self.factor - Self::STEP);
    }

    /// Back to 100%
    pub fn reset(&mut self) {
        self.factor = Self::DEFAULT_SCALE;
    }

    #[must_use]
    pub fn can_step_in(&self) -> bool {
        self.factor < Self::MAX_SCALE
    }

    #[must_use]
    pub fn can_step_out(&self) -> bool {
        self.factor > Self::MIN_SCALE
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.factor == Self::DEFAULT_SCALE
    }

    /// Percentage label, e.g. `"125%"`
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.0}%", self.factor * 100.0)
    }

    /// Snap to the step grid and clamp to the valid range, handling NaN/Inf
    #[must_use]
    pub fn clamp_factor(factor: f32) -> f32 {
        if !factor.is_finite() {
            return Self::DEFAULT_SCALE;
        }
        let snapped = (factor / Self::STEP).round() * Self::STEP;
        snapped.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
    }

    /// Zoom at an arbitrary factor (snapped and clamped)
    #[must_use]
    pub fn with_factor(factor: f32) -> Self {
        Self {
            factor: Self::clamp_factor(factor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_stay_within_bounds() {
        let mut zoom = Zoom::default();
        for _ in 0..40 {
            zoom.step_in();
            assert!(zoom.factor() <= Zoom::MAX_SCALE);
        }
        assert_eq!(zoom.factor(), 5.0);
        assert!(!zoom.can_step_in());

        for _ in 0..40 {
            zoom.step_out();
            assert!(zoom.factor() >= Zoom::MIN_SCALE);
        }
        assert_eq!(zoom.factor(), 0.25);
        assert!(!zoom.can_step_out());
    }

    #[test]
    fn mixed_sequence_never_leaves_range() {
        let mut zoom = Zoom::default();
        let pattern = [true, true, false, true, false, false, false, false, false, true];
        for (i, step_in) in pattern.iter().cycle().take(200).enumerate() {
            if *step_in ^ (i % 7 == 0) {
                zoom.step_in();
            } else {
                zoom.step_out();
            }
            assert!((Zoom::MIN_SCALE..=Zoom::MAX_SCALE).contains(&zoom.factor()));
        }
    }

    #[test]
    fn reset_is_exactly_one() {
        let mut zoom = Zoom::default();
        zoom.step_in();
        zoom.step_in();
        zoom.step_out();
        assert!(!zoom.is_default());
        zoom.reset();
        assert_eq!(zoom.factor(), 1.0);
        assert!(zoom.is_default());
    }

    #[test]
    fn clamp_handles_garbage() {
        assert_eq!(Zoom::clamp_factor(f32::NAN), 1.0);
        assert_eq!(Zoom::clamp_factor(f32::INFINITY), 1.0);
        assert_eq!(Zoom::clamp_factor(0.01), 0.25);
        assert_eq!(Zoom::clamp_factor(1.3), 1.25);
        assert_eq!(Zoom::with_factor(9.0).factor(), 5.0);
    }

    #[test]
    fn percent_label() {
        assert_eq!(Zoom::with_factor(1.25).percent_label(), "125%");
    }
}
