//! The interaction signal and how raw input becomes one.
//!
//! The animation loop only ever sees an [`InteractionSignal`]. Two mappings
//! produce it: [`GestureReducer`] folds hand landmarks into a signal, and
//! [`InteractionSignal::pointer`] maps a cursor position when no hands are
//! being tracked.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Lower bound of the display scale.
pub const SCALE_MIN: f32 = 0.5;
/// Upper bound of the display scale.
pub const SCALE_MAX: f32 = 3.0;

/// Tension reported when no hand is visible.
pub const IDLE_TENSION: f32 = 0.5;
/// Scale reported when fewer than two hands are visible under
/// [`ScalePolicy::Reset`].
pub const REST_SCALE: f32 = 1.0;

/// Landmarks per tracked hand.
pub const LANDMARKS_PER_HAND: usize = 21;
/// Wrist landmark index.
pub const WRIST: usize = 0;
/// Fingertip landmark indices, thumb to little finger.
pub const FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];

/// Mean tip-to-wrist distance of a closed fist.
const OPENNESS_OFFSET: f32 = 0.05;
const OPENNESS_GAIN: f32 = 4.0;
const SPREAD_GAIN: f32 = 4.0;

/// Control input for one frame.
///
/// `tension` drives how far particles are pushed off their target;
/// `scale` drives the display scale of the whole cloud. Both are clamped
/// on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionSignal {
    tension: f32,
    scale: f32,
    active: bool,
}

impl InteractionSignal {
    /// Build a signal, clamping tension to `[0, 1]` and scale to
    /// `[0.5, 3]`. Non-finite values fall back to the idle defaults.
    pub fn new(tension: f32, scale: f32, active: bool) -> Self {
        Self {
            tension: clamp_or(tension, 0.0, 1.0, IDLE_TENSION),
            scale: clamp_or(scale, SCALE_MIN, SCALE_MAX, REST_SCALE),
            active,
        }
    }

    /// Map a normalized cursor position to a signal.
    ///
    /// `x` and `y` are in `[0, 1]` with `y = 0` at the top of the window.
    /// Moving up raises tension, moving right grows the cloud.
    pub fn pointer(x: f32, y: f32) -> Self {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        Self::new(1.0 - y, SCALE_MIN + (SCALE_MAX - SCALE_MIN) * x, false)
    }

    #[inline]
    pub fn tension(&self) -> f32 {
        self.tension
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether at least one hand is tracked.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Default for InteractionSignal {
    fn default() -> Self {
        Self {
            tension: IDLE_TENSION,
            scale: REST_SCALE,
            active: false,
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// The 21 landmarks of one hand in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks(pub [Vec2; LANDMARKS_PER_HAND]);

impl HandLandmarks {
    #[inline]
    pub fn wrist(&self) -> Vec2 {
        self.0[WRIST]
    }

    /// How open the hand is, in `[0, 1]`.
    ///
    /// Mean fingertip-to-wrist distance, offset so a fist reads near zero
    /// and scaled so a spread hand saturates at one.
    pub fn openness(&self) -> f32 {
        let wrist = self.wrist();
        let sum: f32 = FINGERTIPS.iter().map(|&tip| self.0[tip].distance(wrist)).sum();
        let mean = sum / FINGERTIPS.len() as f32;
        ((mean - OPENNESS_OFFSET) * OPENNESS_GAIN).clamp(0.0, 1.0)
    }
}

/// One frame of tracking output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
}

/// What the scale does while fewer than two hands are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalePolicy {
    /// Snap back to the rest scale.
    #[default]
    Reset,
    /// Keep the last two-hand scale.
    Hold,
}

/// Folds tracked hands into an [`InteractionSignal`].
#[derive(Debug, Clone)]
pub struct GestureReducer {
    policy: ScalePolicy,
    last_scale: f32,
}

impl GestureReducer {
    pub fn new(policy: ScalePolicy) -> Self {
        Self {
            policy,
            last_scale: REST_SCALE,
        }
    }

    #[inline]
    pub fn policy(&self) -> ScalePolicy {
        self.policy
    }

    /// Reduce one frame of hands to a signal.
    ///
    /// Tension is the mean openness over all hands. With exactly two hands
    /// the scale follows the distance between the wrists; otherwise it
    /// follows the configured [`ScalePolicy`].
    pub fn reduce(&mut self, hands: &[HandLandmarks]) -> InteractionSignal {
        if hands.is_empty() {
            return InteractionSignal::new(IDLE_TENSION, self.idle_scale(), false);
        }

        let tension = hands.iter().map(HandLandmarks::openness).sum::<f32>() / hands.len() as f32;

        let scale = if let [a, b] = hands {
            let spread = (a.wrist().distance(b.wrist()) * SPREAD_GAIN).clamp(SCALE_MIN, SCALE_MAX);
            self.last_scale = spread;
            spread
        } else {
            self.idle_scale()
        };

        InteractionSignal::new(tension, scale, true)
    }

    fn idle_scale(&self) -> f32 {
        match self.policy {
            ScalePolicy::Reset => REST_SCALE,
            ScalePolicy::Hold => self.last_scale,
        }
    }
}

impl Default for GestureReducer {
    fn default() -> Self {
        Self::new(ScalePolicy::default())
    }
}
