use crate::{
    AnimatorOutput, BlendMode, BoneMask, BoneTransform, GraphData, LayerOutput, Pose,
    RootMotionDelta,
};
use glam::{Quat, Vec3};

const WEIGHT_EPSILON: f32 = 1.0e-6;

/// The pose-sampling collaborator: turns a clip and a normalized time into bone transforms.
///
/// Clips played by additive layers are expected to produce deltas (translation offset, rotation
/// delta, scale factor) rather than absolute transforms.
pub trait ClipSampler {
    /// Writes the clip's pose at `normalized_time` into `pose`, which arrives sized to the
    /// skeleton and filled with identity.
    fn sample(&mut self, clip: usize, normalized_time: f32, pose: &mut Pose);

    /// Root displacement between two normalized times of a clip. `time` is smaller than
    /// `previous_time` when a looping clip wrapped.
    fn root_motion(&mut self, clip: usize, previous_time: f32, time: f32) -> RootMotionDelta {
        let _ = (clip, previous_time, time);
        RootMotionDelta::IDENTITY
    }
}

/// Merges the per-layer sampler lists of an [`AnimatorOutput`] into one pose.
///
/// Every layer is sampled into its own pose before any composition happens. Override layers are
/// then applied in ascending order (the first contributing one overwrites its masked-in bones,
/// later ones blend by `weight * coverage`), followed by additive layers. Root motion follows the
/// same override order, and a layer whose mask leaves out the root bone contributes none.
///
/// Sampler weights within a layer are normalized by their sum, with coverage capped at 1. Two
/// curves of an independent transition that both sit at 1 therefore sample as an even split,
/// not as two full contributions.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    root_bone: usize,
    layer_poses: Vec<Pose>,
    coverage: Vec<f32>,
    sample: Pose,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `bone` as the root when deciding which masked layers move the owner. Defaults to 0.
    pub fn with_root_bone(mut self, bone: usize) -> Self {
        self.root_bone = bone;
        self
    }

    pub fn root_bone(&self) -> usize {
        self.root_bone
    }

    /// Composes `output` into `pose` and returns the weighted root motion of the override
    /// layers. `pose` supplies both the bone count and the transforms of bones no layer covers.
    pub fn compose<S: ClipSampler + ?Sized>(
        &mut self,
        graph: &GraphData,
        output: &AnimatorOutput,
        sampler: &mut S,
        pose: &mut Pose,
    ) -> RootMotionDelta {
        let bone_count = pose.len();
        self.layer_poses.resize_with(output.layers.len(), Pose::default);
        self.coverage.clear();

        for (layer, layer_pose) in output.layers.iter().zip(self.layer_poses.iter_mut()) {
            let coverage =
                sample_layer(layer, &mut *sampler, bone_count, &mut self.sample, layer_pose);
            self.coverage.push(coverage);
        }

        let mut root_motion = RootMotionDelta::IDENTITY;
        let mut first = true;
        let mut first_root = true;
        for (index, layer) in output.layers.iter().enumerate() {
            if layer.blend_mode != BlendMode::Override || self.coverage[index] <= 0.0 {
                continue;
            }
            let mask = layer.mask.and_then(|m| graph.mask(m));
            let overwrite = first;
            let factor = layer.weight * self.coverage[index];
            blend_layer(pose, &self.layer_poses[index], mask, |prior, layer_bone| {
                if overwrite {
                    *layer_bone
                } else {
                    prior.lerp(layer_bone, factor)
                }
            });

            if mask.is_none_or(|m| m.contains(self.root_bone)) {
                let delta = layer_root_motion(layer, &mut *sampler);
                root_motion = if first_root {
                    delta
                } else {
                    root_motion.lerp(&delta, factor)
                };
                first_root = false;
            }
            first = false;
        }

        for (index, layer) in output.layers.iter().enumerate() {
            if layer.blend_mode != BlendMode::Additive || self.coverage[index] <= 0.0 {
                continue;
            }
            let mask = layer.mask.and_then(|m| graph.mask(m));
            let factor = layer.weight * self.coverage[index];
            blend_layer(pose, &self.layer_poses[index], mask, |prior, delta| {
                prior.add(delta, factor)
            });
        }

        root_motion
    }
}

/// Samples every clip of a layer into `layer_pose` as a normalized weighted average and returns
/// the layer's coverage, `min(sum of weights, 1)`.
fn sample_layer<S: ClipSampler + ?Sized>(
    layer: &LayerOutput,
    sampler: &mut S,
    bone_count: usize,
    scratch: &mut Pose,
    layer_pose: &mut Pose,
) -> f32 {
    let total: f32 = layer.samplers.iter().map(|s| s.weight.max(0.0)).sum();
    if total <= WEIGHT_EPSILON {
        layer_pose.reset(bone_count);
        return 0.0;
    }

    let zero = BoneTransform::new(Vec3::ZERO, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0), Vec3::ZERO);
    layer_pose.reset(bone_count);
    layer_pose.bones_mut().fill(zero);

    for s in &layer.samplers {
        let weight = s.weight.max(0.0) / total;
        if weight <= 0.0 {
            continue;
        }
        scratch.reset(bone_count);
        sampler.sample(s.clip, s.normalized_time, scratch);
        for (acc, bone) in layer_pose.bones_mut().iter_mut().zip(scratch.bones()) {
            acc.translation += bone.translation * weight;
            acc.scale += bone.scale * weight;
            // Keep quaternions in one hemisphere so the sum does not cancel out.
            let rotation = if acc.rotation.dot(bone.rotation) < 0.0 {
                -bone.rotation
            } else {
                bone.rotation
            };
            acc.rotation = acc.rotation + rotation * weight;
        }
    }

    for bone in layer_pose.bones_mut() {
        bone.rotation = if bone.rotation.length_squared() > WEIGHT_EPSILON {
            bone.rotation.normalize()
        } else {
            Quat::IDENTITY
        };
    }
    total.min(1.0)
}

/// Root displacement of a layer, weighted the way [`sample_layer`] weights its poses.
fn layer_root_motion<S: ClipSampler + ?Sized>(
    layer: &LayerOutput,
    sampler: &mut S,
) -> RootMotionDelta {
    let total: f32 = layer.samplers.iter().map(|s| s.weight.max(0.0)).sum();
    if total <= WEIGHT_EPSILON {
        return RootMotionDelta::IDENTITY;
    }
    let mut delta = RootMotionDelta::IDENTITY;
    for s in &layer.samplers {
        let weight = s.weight.max(0.0) / total;
        if weight <= 0.0 {
            continue;
        }
        let clip = sampler.root_motion(s.clip, s.previous_time, s.normalized_time);
        delta = delta.then(&clip.scaled(weight));
    }
    delta
}

fn blend_layer(
    pose: &mut Pose,
    layer_pose: &Pose,
    mask: Option<&BoneMask>,
    blend: impl Fn(&BoneTransform, &BoneTransform) -> BoneTransform,
) {
    for (bone, (target, source)) in pose
        .bones_mut()
        .iter_mut()
        .zip(layer_pose.bones())
        .enumerate()
    {
        if mask.is_some_and(|m| !m.contains(bone)) {
            continue;
        }
        *target = blend(target, source);
    }
}
