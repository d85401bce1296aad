//! JSON diagnostics dump of an animator's runtime state.

use crate::{
    Animator, AnimatorOutput, BlendMode, Error, Frame, InFlightTransition, ParameterValue, Phase,
    Playback,
};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct ParameterSnapshot {
    pub name: String,
    pub value: ParameterValue,
}

#[derive(Clone, Debug, Serialize)]
pub struct LayerSnapshot {
    pub layer: usize,
    pub enabled: bool,
    pub weight: f32,
    pub blend_mode: BlendMode,
    pub mask: Option<usize>,
    pub phase: Phase,
    pub state_name: Option<String>,
    pub stack: Vec<Frame>,
    pub current: Option<Playback>,
    pub transition: Option<InFlightTransition>,
}

/// Point-in-time view of an [`Animator`], for debugging tools and logs.
#[derive(Clone, Debug, Serialize)]
pub struct AnimatorSnapshot {
    pub parameters: Vec<ParameterSnapshot>,
    pub layers: Vec<LayerSnapshot>,
    pub output: AnimatorOutput,
}

impl AnimatorSnapshot {
    pub fn capture(animator: &Animator) -> Self {
        let graph = animator.graph();
        let parameters = graph
            .parameters
            .iter()
            .enumerate()
            .filter_map(|(index, def)| {
                Some(ParameterSnapshot {
                    name: def.name.clone(),
                    value: animator.parameters().value(index)?,
                })
            })
            .collect();

        let layers = (0..animator.layer_count())
            .filter_map(|index| {
                let layer = animator.layer(index)?;
                let machine = layer.machine();
                Some(LayerSnapshot {
                    layer: index,
                    enabled: layer.is_enabled(),
                    weight: layer.weight(),
                    blend_mode: layer.blend_mode(),
                    mask: layer.mask(),
                    phase: machine.phase(),
                    state_name: animator.current_state_name(index).map(str::to_string),
                    stack: machine.stack().to_vec(),
                    current: machine.current().copied(),
                    transition: machine.transition().copied(),
                })
            })
            .collect();

        Self {
            parameters,
            layers,
            output: animator.output().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::JsonWrite {
            message: e.to_string(),
        })
    }
}

impl Animator {
    pub fn snapshot(&self) -> AnimatorSnapshot {
        AnimatorSnapshot::capture(self)
    }
}
