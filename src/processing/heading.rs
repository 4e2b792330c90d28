//! Compass heading smoothing with wrap-around correction

/// Default fraction of the remaining difference applied per update
pub const DEFAULT_HEADING_SMOOTHING: f64 = 0.1;

/// Displayed heading that chases the raw compass heading along the short arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSmoother {
    /// Heading currently shown, degrees in [0, 360)
    shown: f64,
    /// Blend factor per update (0, 1]
    smoothing: f64,
}

impl Default for HeadingSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_SMOOTHING)
    }
}

impl HeadingSmoother {
    pub fn new(smoothing: f64) -> Self {
        Self {
            shown: 0.0,
            smoothing: smoothing.clamp(f64::EPSILON, 1.0),
        }
    }

    /// Jump straight to a heading, e.g. when a new layer is shown
    pub fn reset(&mut self, heading: f64) {
        self.shown = wrap_degrees(heading);
    }

    pub fn shown(&self) -> f64 {
        self.shown
    }

    /// Blend the shown heading toward `raw` and return the new value
    pub fn update(&mut self, raw: f64) -> f64 {
        let mut current = raw;
        let mut shown = self.shown;
        if (current - shown).abs() > 180.0 {
            if current < shown {
                current += 360.0;
            } else {
                shown += 360.0;
            }
        }
        shown += (current - shown) * self.smoothing;
        self.shown = wrap_degrees(shown);
        self.shown
    }
}

/// Wrap an angle into [0, 360)
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_blends_a_tenth_per_update() {
        let mut smoother = HeadingSmoother::default();
        smoother.reset(10.0);
        let shown = smoother.update(20.0);
        assert!((shown - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_takes_short_path_across_north() {
        let mut smoother = HeadingSmoother::default();
        smoother.reset(350.0);

        // 350 -> 10 goes clockwise through 0, not back through 180
        let shown = smoother.update(10.0);
        assert!((shown - 352.0).abs() < 1e-9);

        smoother.reset(10.0);
        let shown = smoother.update(350.0);
        assert!((shown - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_wraps_past_north() {
        let mut smoother = HeadingSmoother::new(1.0);
        smoother.reset(355.0);
        let shown = smoother.update(5.0);
        assert!((shown - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert!((wrap_degrees(-10.0) - 350.0).abs() < 1e-12);
        assert!((wrap_degrees(725.0) - 5.0).abs() < 1e-12);
        assert!(wrap_degrees(-1e-18) < 360.0);
    }

    proptest! {
        #[test]
        fn shown_heading_stays_in_range(start in 0.0f64..360.0, raws in prop::collection::vec(0.0f64..360.0, 1..50)) {
            let mut smoother = HeadingSmoother::default();
            smoother.reset(start);
            for raw in raws {
                let before = smoother.shown();
                let shown = smoother.update(raw);
                prop_assert!((0.0..360.0).contains(&shown));

                // Angular step never exceeds the raw short-arc difference
                let raw_delta = {
                    let d = (raw - before).abs();
                    d.min(360.0 - d)
                };
                let step = {
                    let d = (shown - before).abs();
                    d.min(360.0 - d)
                };
                prop_assert!(step <= raw_delta + 1e-9);
            }
        }
    }
}
