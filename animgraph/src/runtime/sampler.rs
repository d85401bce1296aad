use super::blend_tree::BlendScratch;
use crate::{AnimationEvent, BlendMode};

/// One clip to sample this tick.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Sampler {
    pub clip: usize,
    /// Position in `[0, 1]`.
    pub normalized_time: f32,
    /// Position at the previous tick, for root-motion extraction.
    pub previous_time: f32,
    pub weight: f32,
    pub speed: f32,
    pub mask: Option<usize>,
}

/// Samplers produced by one layer, with the layer's composition settings.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct LayerOutput {
    pub layer: usize,
    pub weight: f32,
    pub blend_mode: BlendMode,
    pub mask: Option<usize>,
    pub samplers: Vec<Sampler>,
}

/// Everything an animator produced in its last update.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct AnimatorOutput {
    /// Ordered by layer index. Disabled layers are absent.
    pub layers: Vec<LayerOutput>,
    /// Markers crossed by each layer's playing state. The outgoing state of a crossfade keeps
    /// advancing but reports nothing, so a footstep on a clip that is fading out is never seen.
    pub events: Vec<AnimationEvent>,
}

impl AnimatorOutput {
    pub fn clear(&mut self) {
        self.layers.clear();
        self.events.clear();
    }

    /// Every sampler of every layer, in layer order.
    pub fn samplers(&self) -> impl Iterator<Item = &Sampler> {
        self.layers.iter().flat_map(|l| l.samplers.iter())
    }
}

/// Buffers reused across ticks so evaluation does not allocate in steady state.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    pub(crate) blend: BlendScratch,
    pub(crate) weights: Vec<f32>,
}
