use glam::{Quat, Vec3};

/// Movement of the root for one tick, in the owner's space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RootMotionDelta {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for RootMotionDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RootMotionDelta {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// This delta followed by `next`.
    pub fn then(&self, next: &Self) -> Self {
        Self {
            translation: self.translation + next.translation,
            rotation: (next.rotation * self.rotation).normalize(),
        }
    }

    /// The delta scaled by `weight`: translation linearly, rotation slerped from identity.
    pub fn scaled(&self, weight: f32) -> Self {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        Self {
            translation: self.translation * weight,
            rotation: Quat::IDENTITY.slerp(self.rotation, weight.min(1.0)),
        }
    }

    /// Blends from this delta towards `other` by `t` in `[0, 1]`.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }
}

/// Something placed in the world that root motion moves.
pub trait RootMotionOwner {
    fn apply_root_motion(&mut self, delta: &RootMotionDelta);
}

/// Minimal world transform for owners that do not carry their own.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OwnerTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for OwnerTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl RootMotionOwner for OwnerTransform {
    fn apply_root_motion(&mut self, delta: &RootMotionDelta) {
        self.rotation = (delta.rotation * self.rotation).normalize();
        self.translation += delta.translation;
    }
}

/// Collects the deltas produced during a tick and hands them to the owner once.
#[derive(Clone, Debug, Default)]
pub struct RootMotionAccumulator {
    pending: Option<RootMotionDelta>,
}

impl RootMotionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: RootMotionDelta) {
        self.pending = Some(match self.pending {
            Some(pending) => pending.then(&delta),
            None => delta,
        });
    }

    pub fn pending(&self) -> Option<&RootMotionDelta> {
        self.pending.as_ref()
    }

    /// Applies and clears the pending delta. Returns false when there was nothing to apply.
    pub fn transfer(&mut self, owner: &mut impl RootMotionOwner) -> bool {
        match self.pending.take() {
            Some(delta) => {
                owner.apply_root_motion(&delta);
                true
            }
            None => false,
        }
    }
}
