use crate::{StateRef, TransitionCurve, TransitionRef};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransitionWeights {
    pub from: f32,
    pub to: f32,
}

/// A crossfade in progress. The destination is the layer's current state.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct InFlightTransition {
    pub transition: TransitionRef,
    pub from: StateRef,
    /// Accumulated normalized time of the outgoing state.
    pub from_time: f32,
    pub from_last_time: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl InFlightTransition {
    pub fn progress(&self) -> f32 {
        transition_progress(self.elapsed, self.duration)
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

pub fn transition_progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Outgoing/incoming weights at `progress`.
///
/// Without a curve the outgoing weight falls linearly from 1 to 0. A complementary curve drives
/// the outgoing weight and the incoming weight is its complement; independent curves drive each
/// side separately and the pair is not normalized.
pub fn transition_weights(curve: Option<&TransitionCurve>, progress: f32) -> TransitionWeights {
    let progress = progress.clamp(0.0, 1.0);
    match curve {
        None => TransitionWeights {
            from: 1.0 - progress,
            to: progress,
        },
        Some(TransitionCurve::Complementary(curve)) => {
            let from = curve.evaluate(progress).clamp(0.0, 1.0);
            TransitionWeights {
                from,
                to: 1.0 - from,
            }
        }
        Some(TransitionCurve::Independent { from, to }) => TransitionWeights {
            from: from.evaluate(progress).clamp(0.0, 1.0),
            to: to.evaluate(progress).clamp(0.0, 1.0),
        },
    }
}

/// Start time of a destination: wrapped into `[0, 1)` when it loops, clamped to `[0, 1]` when it
/// does not.
pub fn offset_start_time(offset: f32, looped: bool) -> f32 {
    if !offset.is_finite() {
        return 0.0;
    }
    if looped {
        offset.rem_euclid(1.0)
    } else {
        offset.clamp(0.0, 1.0)
    }
}

/// Normalized sampling position of an accumulated normalized time.
pub fn sample_time(time: f32, looped: bool) -> f32 {
    if looped {
        let t = time.rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
        if t >= 1.0 { 0.0 } else { t }
    } else {
        time.clamp(0.0, 1.0)
    }
}
