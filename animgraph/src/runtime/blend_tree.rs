use crate::{
    Blend2DAlgorithm, BlendChild1D, BlendChild2D, GraphData, Motion, ParameterStore,
};
use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Effective length and speed of a state's motion for the current parameter values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotionPlayback {
    /// Seconds per normalized cycle at speed 1. Zero when nothing playable is assigned.
    pub duration: f32,
    pub speed: f32,
}

/// Reusable buffers for blend evaluation.
#[derive(Clone, Debug, Default)]
pub struct BlendScratch {
    order: Vec<(f32, usize)>,
    distance_weights: Vec<f32>,
}

/// Weights for a 1D blend: the bracketing pair of thresholds shares the weight linearly, values
/// outside the threshold range clamp to the nearest edge.
pub fn linear_blend_weights(children: &[BlendChild1D], value: f32, out: &mut Vec<f32>) {
    out.clear();
    out.resize(children.len(), 0.0);
    if children.is_empty() {
        return;
    }
    let value = if value.is_nan() { 0.0 } else { value };

    let last = children.len() - 1;
    if children.len() == 1 || value <= children[0].threshold {
        out[0] = 1.0;
        return;
    }
    if value >= children[last].threshold {
        out[last] = 1.0;
        return;
    }

    let upper = children.partition_point(|c| c.threshold <= value);
    let lower = upper - 1;
    let span = children[upper].threshold - children[lower].threshold;
    if span <= f32::EPSILON {
        out[upper] = 1.0;
        return;
    }
    let t = (value - children[lower].threshold) / span;
    out[lower] = 1.0 - t;
    out[upper] = t;
}

/// Inverse distance weighting: weight ∝ 1/d². A sample within `epsilon` of the input takes the
/// full weight.
pub fn inverse_distance_weights(
    children: &[BlendChild2D],
    input: Vec2,
    epsilon: f32,
    out: &mut Vec<f32>,
) {
    out.clear();
    out.resize(children.len(), 0.0);
    if children.is_empty() {
        return;
    }
    let input = sanitize(input);
    let exact = epsilon * epsilon;

    for (i, child) in children.iter().enumerate() {
        let d2 = (child.position - input).length_squared();
        if d2 <= exact {
            out.fill(0.0);
            out[i] = 1.0;
            return;
        }
        out[i] = 1.0 / d2;
    }
    normalize(children, input, epsilon, out);
}

/// Simple directional blending: the two samples whose directions bracket the input share the
/// weight, an optional sample at the origin fills in for inputs shorter than the sector's edge.
pub fn simple_directional_weights(
    children: &[BlendChild2D],
    input: Vec2,
    epsilon: f32,
    scratch: &mut BlendScratch,
    out: &mut Vec<f32>,
) {
    out.clear();
    out.resize(children.len(), 0.0);
    match children.len() {
        0 => return,
        1 => {
            out[0] = 1.0;
            return;
        }
        _ => {}
    }
    let input = sanitize(input);
    let eps2 = epsilon * epsilon;

    let center = children
        .iter()
        .position(|c| c.position.length_squared() <= eps2);
    let order = &mut scratch.order;
    order.clear();
    order.extend(
        children
            .iter()
            .enumerate()
            .filter(|&(i, c)| Some(i) != center && c.position.length_squared() > eps2)
            .map(|(i, c)| (c.position.y.atan2(c.position.x), i)),
    );
    order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let magnitude = input.length();
    if order.is_empty() || magnitude <= epsilon {
        match center {
            Some(c) => out[c] = 1.0,
            None => {
                let share = 1.0 / order.len() as f32;
                for &(_, i) in order.iter() {
                    out[i] = share;
                }
            }
        }
        normalize(children, input, epsilon, out);
        return;
    }

    if order.len() == 1 {
        let i = order[0].1;
        let p = children[i].position;
        match center {
            Some(c) => {
                let reach = (input.dot(p) / p.length_squared()).clamp(0.0, 1.0);
                out[i] = reach;
                out[c] = 1.0 - reach;
            }
            None => out[i] = 1.0,
        }
        normalize(children, input, epsilon, out);
        return;
    }

    let angle = input.y.atan2(input.x);
    let len = order.len();
    let k = order.partition_point(|&(a, _)| a <= angle);
    let (angle_a, ia) = order[(k + len - 1) % len];
    let (angle_b, ib) = order[k % len];
    let mut sector = angle_b - angle_a;
    if sector <= 0.0 {
        sector += TAU;
    }
    let mut offset = angle - angle_a;
    if offset < 0.0 {
        offset += TAU;
    }

    let pa = children[ia].position;
    let pb = children[ib].position;
    let det = pa.perp_dot(pb);
    let (mut wa, mut wb) = if sector < PI - epsilon && det.abs() > epsilon {
        let wa = input.perp_dot(pb) / det;
        let wb = pa.perp_dot(input) / det;
        (wa.max(0.0), wb.max(0.0))
    } else {
        // Wide sector: interpolate by angle, scale by how far the input reaches toward the rim.
        let t = (offset / sector).clamp(0.0, 1.0);
        let rim = pa.length() + (pb.length() - pa.length()) * t;
        let reach = if rim > epsilon { magnitude / rim } else { 1.0 };
        ((1.0 - t) * reach, t * reach)
    };

    let sum = wa + wb;
    match center {
        Some(c) if sum < 1.0 => {
            out[c] = 1.0 - sum;
        }
        _ => {
            if sum > epsilon {
                wa /= sum;
                wb /= sum;
            } else {
                let t = (offset / sector).clamp(0.0, 1.0);
                wa = 1.0 - t;
                wb = t;
            }
        }
    }
    out[ia] += wa;
    out[ib] += wb;
    normalize(children, input, epsilon, out);
}

pub fn directional_blend_weights(
    algorithm: Blend2DAlgorithm,
    children: &[BlendChild2D],
    input: Vec2,
    epsilon: f32,
    scratch: &mut BlendScratch,
    out: &mut Vec<f32>,
) {
    match algorithm {
        Blend2DAlgorithm::SimpleDirectional => {
            simple_directional_weights(children, input, epsilon, scratch, out)
        }
        Blend2DAlgorithm::InverseDistance => {
            inverse_distance_weights(children, input, epsilon, out)
        }
    }
}

/// Per-child weights of a leaf motion plus its effective duration and speed.
pub(crate) fn evaluate_motion(
    graph: &GraphData,
    motion: &Motion,
    parameters: &ParameterStore,
    epsilon: f32,
    scratch: &mut BlendScratch,
    weights: &mut Vec<f32>,
) -> MotionPlayback {
    let read = |index: usize| {
        parameters
            .value(index)
            .map(|v| v.as_f32())
            .unwrap_or(0.0)
    };
    let clip_duration = |clip: Option<usize>| clip.and_then(|c| graph.clip(c)).map(|c| c.duration);

    weights.clear();
    match motion {
        Motion::SingleClip { clip } => {
            weights.push(1.0);
            MotionPlayback {
                duration: clip_duration(*clip).unwrap_or(0.0),
                speed: 1.0,
            }
        }
        Motion::LinearBlend1D(tree) => {
            linear_blend_weights(&tree.children, read(tree.parameter), weights);
            let durations = tree.children.iter().map(|c| clip_duration(c.clip));
            let speeds = tree.children.iter().map(|c| c.speed);
            effective_playback(weights, durations, speeds)
        }
        Motion::Directional2DBlend(tree) => {
            let input = Vec2::new(read(tree.parameter_x), read(tree.parameter_y));
            directional_blend_weights(
                tree.algorithm,
                &tree.children,
                input,
                epsilon,
                scratch,
                weights,
            );
            let mut distance_weights = std::mem::take(&mut scratch.distance_weights);
            inverse_distance_weights(&tree.children, input, epsilon, &mut distance_weights);
            let durations = tree.children.iter().map(|c| clip_duration(c.clip));
            let speeds = tree.children.iter().map(|c| c.speed);
            let playback = effective_playback(&distance_weights, durations, speeds);
            scratch.distance_weights = distance_weights;
            playback
        }
        Motion::SubStateMachine { .. } => MotionPlayback {
            duration: 0.0,
            speed: 0.0,
        },
    }
}

fn effective_playback(
    weights: &[f32],
    durations: impl Iterator<Item = Option<f32>>,
    speeds: impl Iterator<Item = f32>,
) -> MotionPlayback {
    let mut duration = 0.0;
    let mut duration_weight = 0.0;
    for (w, d) in weights.iter().zip(durations) {
        if let Some(d) = d {
            duration += w * d;
            duration_weight += w;
        }
    }
    let speed: f32 = weights.iter().zip(speeds).map(|(w, s)| w * s).sum();
    MotionPlayback {
        duration: if duration_weight > f32::EPSILON {
            duration / duration_weight
        } else {
            0.0
        },
        speed: if weights.is_empty() { 1.0 } else { speed },
    }
}

fn sanitize(input: Vec2) -> Vec2 {
    Vec2::new(
        if input.x.is_finite() { input.x } else { 0.0 },
        if input.y.is_finite() { input.y } else { 0.0 },
    )
}

/// Clamps weights to be non-negative and rescales them to sum to 1. A degenerate set gives the
/// sample nearest to `input` the full weight.
fn normalize(children: &[BlendChild2D], input: Vec2, epsilon: f32, out: &mut [f32]) {
    let mut sum = 0.0;
    for w in out.iter_mut() {
        if !w.is_finite() || *w < 0.0 {
            *w = 0.0;
        }
        sum += *w;
    }
    if sum > epsilon {
        for w in out.iter_mut() {
            *w /= sum;
        }
        return;
    }

    out.fill(0.0);
    let nearest = children
        .iter()
        .enumerate()
        .min_by(|a, b| {
            let da = (a.1.position - input).length_squared();
            let db = (b.1.position - input).length_squared();
            da.total_cmp(&db)
        })
        .map(|(i, _)| i);
    if let Some(i) = nearest {
        out[i] = 1.0;
    }
}
