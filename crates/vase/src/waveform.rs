//! Periodic waveforms used for radial and vertical modulation.
//!
//! Every waveform has period 2π and maps into [-1, 1]. Inputs are wrapped
//! into [0, 2π) before evaluation so that `x` and `x + 2π` land on the same
//! branch, which keeps the seam column of the surface identical to column 0.

use std::f64::consts::{PI, TAU};

use vase_config::WaveType;

/// Distance below 2π that still counts as a full turn
const SEAM_EPSILON: f64 = 1e-9;

/// Wrap an angle into [0, 2π).
///
/// Whole turns such as `6 * 2π` can come out of `rem_euclid` a rounding step
/// below 2π; those snap to 0 so that they take the same branch as 0.
fn normalize(x: f64) -> f64 {
    let t = x.rem_euclid(TAU);
    if TAU - t < SEAM_EPSILON { 0.0 } else { t }
}

pub fn sine(x: f64) -> f64 {
    x.sin()
}

/// +1 on [0, π), -1 on [π, 2π). Never returns 0.
pub fn square(x: f64) -> f64 {
    if normalize(x) < PI { 1.0 } else { -1.0 }
}

/// Symmetric triangle: -1 at 0, +1 at π.
pub fn triangle(x: f64) -> f64 {
    let p = normalize(x) / TAU;
    2.0 * (2.0 * (p - (p + 0.5).floor())).abs() - 1.0
}

/// Rising ramp from -1 at 0 towards +1 just before 2π.
pub fn sawtooth(x: f64) -> f64 {
    normalize(x) / PI - 1.0
}

/// Evaluate the waveform selected by `kind` at angle `x` (radians).
pub fn evaluate(kind: WaveType, x: f64) -> f64 {
    match kind {
        WaveType::Sine => sine(x),
        WaveType::Square => square(x),
        WaveType::Triangle => triangle(x),
        WaveType::Sawtooth => sawtooth(x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [WaveType; 4] = [
        WaveType::Sine,
        WaveType::Square,
        WaveType::Triangle,
        WaveType::Sawtooth,
    ];

    fn samples() -> impl Iterator<Item = f64> {
        (-400..=400).map(|i| i as f64 * 0.0371)
    }

    #[test]
    fn test_output_in_unit_range() {
        for kind in KINDS {
            for x in samples() {
                let y = evaluate(kind, x);
                assert!(
                    (-1.0..=1.0).contains(&y),
                    "{:?}({}) = {} out of range",
                    kind,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_periodic_over_two_pi() {
        for kind in KINDS {
            for x in samples() {
                let a = evaluate(kind, x);
                let b = evaluate(kind, x + TAU);
                assert!((a - b).abs() < 1e-9, "{:?} not periodic at {}", kind, x);
            }
        }
    }

    #[test]
    fn test_seam_points_agree() {
        for kind in KINDS {
            assert!((evaluate(kind, 0.0) - evaluate(kind, TAU)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_whole_turns_take_the_zero_branch() {
        for turns in 1..=64 {
            let x = turns as f64 * TAU;
            assert_eq!(square(x), 1.0, "square at {} turns", turns);
            assert!((sawtooth(x) + 1.0).abs() < 1e-6, "sawtooth at {} turns", turns);
        }
    }

    #[test]
    fn test_square_never_zero() {
        assert_eq!(square(0.0), 1.0);
        assert_eq!(square(PI), -1.0);
        assert_eq!(square(TAU), 1.0);
        assert_eq!(square(-0.1), -1.0);
    }

    #[test]
    fn test_triangle_extremes() {
        assert!((triangle(0.0) + 1.0).abs() < 1e-12);
        assert!((triangle(PI) - 1.0).abs() < 1e-12);
        assert!(triangle(PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sawtooth_ramp() {
        assert!((sawtooth(0.0) + 1.0).abs() < 1e-12);
        assert!(sawtooth(PI).abs() < 1e-12);
        assert!(sawtooth(TAU - 1e-6) < 1.0);
    }
}
