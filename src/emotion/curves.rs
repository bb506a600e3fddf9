//! Easing curves for emotion transitions
//!
//! Pure functions mapping `progress ∈ [0,1]` to an eased value in [0,1].
//! The first four curves are monotone non-decreasing; monotonicity of a
//! Bézier curve is the caller's responsibility. Out-of-range inputs are
//! clamped to [0,1] before evaluation.

use serde::{Deserialize, Serialize};

use super::profile::EmotionKind;

/// Curve shape of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCurve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Cubic Bézier across (0,0), cp1, cp2, (1,1). Progress is treated
    /// as the x coordinate: the curve parameter is solved from x, then
    /// y is evaluated, so control points on the diagonal behave as
    /// linear.
    Bezier,
}

impl TransitionCurve {
    /// Evaluate the curve at `progress`. Bézier requires `control`;
    /// without control points it degrades to linear.
    pub fn ease(&self, progress: f32, control: Option<[(f32, f32); 2]>) -> f32 {
        let x = progress.clamp(0.0, 1.0);
        match self {
            TransitionCurve::Linear => x,
            TransitionCurve::EaseIn => ease_in(x),
            TransitionCurve::EaseOut => ease_out(x),
            TransitionCurve::EaseInOut => ease_in_out(x),
            TransitionCurve::Bezier => match control {
                Some([cp1, cp2]) => bezier(x, cp1, cp2),
                None => x,
            },
        }
    }
}

/// Quadratic ease-in: x²
pub fn ease_in(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    x * x
}

/// Quadratic ease-out: 1 − (1−x)²
pub fn ease_out(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    1.0 - (1.0 - x) * (1.0 - x)
}

/// Piecewise quadratic ease-in-out
pub fn ease_in_out(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    if x < 0.5 {
        2.0 * x * x
    } else {
        1.0 - 2.0 * (1.0 - x) * (1.0 - x)
    }
}

/// Cubic Bézier through (0,0), cp1, cp2, (1,1), treating `x` as the
/// horizontal coordinate: the curve parameter is recovered from x,
/// then the y polynomial is evaluated there. Control points at (0,0)
/// and (1,1), or anywhere on the diagonal, reproduce linear.
pub fn bezier(x: f32, cp1: (f32, f32), cp2: (f32, f32)) -> f32 {
    let x = x.clamp(0.0, 1.0);
    let t = solve_bezier_parameter(x, cp1.0, cp2.0);
    cubic_component(t, cp1.1, cp2.1).clamp(0.0, 1.0)
}

/// One axis of the cubic with anchors at 0 and 1
fn cubic_component(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Derivative of [`cubic_component`] with respect to t
fn cubic_derivative(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

/// Invert x(t): Newton iteration, falling back to bisection on flat
/// derivative. x(t) is monotone for control x coordinates in [0,1],
/// which transition validation guarantees.
fn solve_bezier_parameter(x: f32, x1: f32, x2: f32) -> f32 {
    let mut t = x;
    for _ in 0..8 {
        let err = cubic_component(t, x1, x2) - x;
        if err.abs() < 1e-6 {
            return t;
        }
        let slope = cubic_derivative(t, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        t = (t - err / slope).clamp(0.0, 1.0);
    }
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..32 {
        let mid = 0.5 * (lo + hi);
        if cubic_component(mid, x1, x2) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Linear interpolation of intensity through an eased progress value
pub fn lerp(from: f32, to: f32, eased: f32) -> f32 {
    from + (to - from) * eased.clamp(0.0, 1.0)
}

/// Natural per-emotion intensity shapes
///
/// Selected by the destination emotion kind when the caller requests
/// natural shaping instead of a named curve. `surprised` is the one
/// deliberately non-monotone shape: a fast spike followed by a decay
/// toward a sustained level.
pub fn natural_shape(kind: EmotionKind, progress: f32) -> f32 {
    let x = progress.clamp(0.0, 1.0);
    match kind {
        // quick rise, settles early
        EmotionKind::Happy => ease_out(x),
        // reluctant onset
        EmotionKind::Sad => x * x * x,
        // sharp attack, near-full almost immediately
        EmotionKind::Angry => 1.0 - (1.0 - x).powi(3),
        EmotionKind::Excited => 1.0 - (1.0 - x).powi(3),
        EmotionKind::Calm => ease_in_out(x),
        // builds late
        EmotionKind::Fearful => ease_in(x),
        // spike within the first fifth, then decay to 0.6
        EmotionKind::Surprised => {
            if x < 0.2 {
                x / 0.2
            } else {
                1.0 - 0.4 * ((x - 0.2) / 0.8)
            }
        }
        EmotionKind::Neutral => x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_endpoints() {
        for curve in [
            TransitionCurve::Linear,
            TransitionCurve::EaseIn,
            TransitionCurve::EaseOut,
            TransitionCurve::EaseInOut,
        ] {
            assert!((curve.ease(0.0, None)).abs() < EPS, "{:?} at 0", curve);
            assert!((curve.ease(1.0, None) - 1.0).abs() < EPS, "{:?} at 1", curve);
        }
    }

    #[test]
    fn test_monotone_non_decreasing() {
        for curve in [
            TransitionCurve::Linear,
            TransitionCurve::EaseIn,
            TransitionCurve::EaseOut,
            TransitionCurve::EaseInOut,
        ] {
            let mut prev = 0.0f32;
            for i in 0..=100 {
                let y = curve.ease(i as f32 / 100.0, None);
                assert!(y >= prev - EPS, "{:?} decreased at step {}", curve, i);
                prev = y;
            }
        }
    }

    #[test]
    fn test_clamps_out_of_range() {
        assert_eq!(TransitionCurve::Linear.ease(-0.5, None), 0.0);
        assert_eq!(TransitionCurve::Linear.ease(1.5, None), 1.0);
        assert_eq!(ease_in(2.0), 1.0);
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        assert!((ease_in_out(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_bezier_degenerate_is_linear() {
        // anchors and diagonal control points reproduce linear within
        // the solver tolerance
        for i in 0..=20 {
            let x = i as f32 / 20.0;
            let y = bezier(x, (0.0, 0.0), (1.0, 1.0));
            assert!((y - x).abs() < 0.02, "bezier({}) = {}", x, y);
            let y = bezier(x, (1.0 / 3.0, 1.0 / 3.0), (2.0 / 3.0, 2.0 / 3.0));
            assert!((y - x).abs() < 0.02, "diagonal bezier({}) = {}", x, y);
        }
    }

    #[test]
    fn test_bezier_ease_shape() {
        // a conventional ease-in-out pair: slow at the ends, endpoints
        // exact, monotone across the span
        let ease = |x: f32| bezier(x, (0.42, 0.0), (0.58, 1.0));
        assert!(ease(0.0).abs() < 1e-4);
        assert!((ease(1.0) - 1.0).abs() < 1e-4);
        assert!(ease(0.1) < 0.1);
        assert!(ease(0.9) > 0.9);
        let mut prev = 0.0f32;
        for i in 0..=50 {
            let y = ease(i as f32 / 50.0);
            assert!(y >= prev - 1e-4, "decreased at step {}", i);
            prev = y;
        }
    }

    #[test]
    fn test_lerp() {
        assert!((lerp(0.2, 0.8, 0.5) - 0.5).abs() < EPS);
        assert!((lerp(0.8, 0.2, 1.0) - 0.2).abs() < EPS);
    }

    #[test]
    fn test_surprised_spikes_then_decays() {
        let peak = natural_shape(EmotionKind::Surprised, 0.2);
        let late = natural_shape(EmotionKind::Surprised, 1.0);
        assert!((peak - 1.0).abs() < EPS);
        assert!((late - 0.6).abs() < EPS);
        assert!(natural_shape(EmotionKind::Surprised, 0.1) < peak);
    }
}
