use glam::{Quat, Vec3};

/// Local transform of one bone.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Interpolates towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Layers `delta` (translation offset, rotation delta, scale factor) on top, scaled by `t`.
    pub fn add(&self, delta: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            translation: self.translation + delta.translation * t,
            rotation: (Quat::IDENTITY.slerp(delta.rotation, t) * self.rotation).normalize(),
            scale: self.scale * Vec3::ONE.lerp(delta.scale, t),
        }
    }
}

/// Per-bone local transforms, indexed like the skeleton the clips were authored against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    bones: Vec<BoneTransform>,
}

impl Pose {
    /// `bone_count` identity transforms.
    pub fn new(bone_count: usize) -> Self {
        Self {
            bones: vec![BoneTransform::IDENTITY; bone_count],
        }
    }

    pub fn from_bones(bones: Vec<BoneTransform>) -> Self {
        Self { bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[BoneTransform] {
        &self.bones
    }

    pub fn bones_mut(&mut self) -> &mut [BoneTransform] {
        &mut self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&BoneTransform> {
        self.bones.get(index)
    }

    pub fn set_bone(&mut self, index: usize, transform: BoneTransform) {
        if let Some(bone) = self.bones.get_mut(index) {
            *bone = transform;
        }
    }

    /// Resizes to `bone_count` and fills with identity.
    pub fn reset(&mut self, bone_count: usize) {
        self.bones.clear();
        self.bones.resize(bone_count, BoneTransform::IDENTITY);
    }
}
