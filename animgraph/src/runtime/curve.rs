use crate::{BlendCurve, CurveKey};

const TIME_EPSILON: f32 = 1.0e-6;

impl BlendCurve {
    /// Samples the curve at `time`, holding the first/last key outside the keyed range.
    pub fn evaluate(&self, time: f32) -> f32 {
        let keys = &self.keys;
        let Some(first) = keys.first() else {
            return 0.0;
        };
        let index = keys.partition_point(|k| k.time <= time);
        if index == 0 {
            return first.value;
        }
        if index >= keys.len() {
            return keys[keys.len() - 1].value;
        }
        hermite(&keys[index - 1], &keys[index], time)
    }
}

fn hermite(prev: &CurveKey, next: &CurveKey, time: f32) -> f32 {
    let span = next.time - prev.time;
    if span.abs() <= TIME_EPSILON {
        return next.value;
    }
    // Infinite tangents mark a stepped segment.
    if !prev.out_tangent.is_finite() || !next.in_tangent.is_finite() {
        return prev.value;
    }

    let t = (time - prev.time) / span;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * prev.value
        + h10 * span * prev.out_tangent
        + h01 * next.value
        + h11 * span * next.in_tangent
}
