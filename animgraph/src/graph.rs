//! Build-time validation of graph content.
//!
//! Everything the per-tick runtime indexes into is checked here, once. A `Graph` can only be
//! obtained through [`Graph::new`] / [`Graph::with_config`], so the runtime never sees an
//! unresolved state, machine, clip, mask or parameter index.

use crate::{
    BlendCurve, BlendMode, Config, Error, GraphData, MachineData, Motion, ParameterId,
    ParameterKind, StateData, TransitionCurve, TransitionData, TransitionTarget,
};
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct Graph {
    data: GraphData,
    /// Sorted by id.
    parameter_lookup: Vec<(ParameterId, usize)>,
}

impl Graph {
    pub fn new(data: GraphData) -> Result<Arc<Self>, Error> {
        Self::with_config(data, &Config::default())
    }

    pub fn with_config(data: GraphData, config: &Config) -> Result<Arc<Self>, Error> {
        let parameter_lookup = validate_parameters(&data)?;
        validate_clips(&data)?;
        validate_layers(&data)?;
        for (index, machine) in data.machines.iter().enumerate() {
            validate_machine(&data, index, machine)?;
        }
        validate_nesting(&data, config.max_nesting_depth)?;
        Ok(Arc::new(Self {
            data,
            parameter_lookup,
        }))
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }

    /// Index into `parameters` for a parameter id.
    pub fn parameter_slot(&self, id: ParameterId) -> Option<usize> {
        self.parameter_lookup
            .binary_search_by_key(&id, |&(id, _)| id)
            .ok()
            .map(|i| self.parameter_lookup[i].1)
    }
}

impl Deref for Graph {
    type Target = GraphData;

    fn deref(&self) -> &GraphData {
        &self.data
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidValue { message }
}

fn validate_parameters(data: &GraphData) -> Result<Vec<(ParameterId, usize)>, Error> {
    let mut lookup = Vec::with_capacity(data.parameters.len());
    for (index, def) in data.parameters.iter().enumerate() {
        if let Some(range) = def.range {
            if def.kind() == ParameterKind::Bool {
                return Err(invalid(format!(
                    "bool parameter '{}' cannot carry a range",
                    def.name
                )));
            }
            if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                return Err(invalid(format!(
                    "parameter '{}' has an invalid range [{}, {}]",
                    def.name, range.min, range.max
                )));
            }
        }
        if let crate::ParameterValue::Float(v) = def.default {
            if !v.is_finite() {
                return Err(invalid(format!(
                    "parameter '{}' has a non-finite default",
                    def.name
                )));
            }
        }
        lookup.push((def.id(), index));
    }
    lookup.sort_by_key(|&(id, _)| id);
    for pair in lookup.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(Error::DuplicateParameter {
                name: data.parameters[pair[1].1].name.clone(),
                id: pair[1].0.0,
            });
        }
    }
    Ok(lookup)
}

fn validate_clips(data: &GraphData) -> Result<(), Error> {
    for clip in &data.clips {
        if !clip.duration.is_finite() || clip.duration < 0.0 {
            return Err(invalid(format!(
                "clip '{}' has an invalid duration {}",
                clip.name, clip.duration
            )));
        }
        if clip.events.iter().any(|e| !e.time.is_finite()) {
            return Err(invalid(format!(
                "clip '{}' has an event with a non-finite time",
                clip.name
            )));
        }
        if clip.events.windows(2).any(|w| w[1].time < w[0].time) {
            return Err(invalid(format!(
                "clip '{}' has events out of time order",
                clip.name
            )));
        }
    }
    Ok(())
}

fn validate_layers(data: &GraphData) -> Result<(), Error> {
    let Some(base) = data.layers.first() else {
        return Err(Error::NoLayers);
    };
    if base.blend_mode != BlendMode::Override || base.weight != 1.0 {
        return Err(Error::InvalidBaseLayer {
            layer: base.name.clone(),
        });
    }

    for layer in &data.layers {
        let context = format!("layer '{}'", layer.name);
        if !(0.0..=1.0).contains(&layer.weight) {
            return Err(invalid(format!(
                "{context} has weight {} outside [0, 1]",
                layer.weight
            )));
        }
        if data.machines.get(layer.machine).is_none() {
            return Err(Error::UnknownMachine {
                context,
                index: layer.machine,
            });
        }
        if let Some(mask) = layer.mask {
            if data.masks.get(mask).is_none() {
                return Err(Error::UnknownMask {
                    context,
                    index: mask,
                });
            }
        }
        let root = &data.machines[layer.machine];
        let has_exit = root
            .states
            .iter()
            .flat_map(|s| s.transitions.iter())
            .any(|t| t.target == TransitionTarget::Exit);
        if has_exit {
            return Err(Error::InvalidExit {
                machine: root.name.clone(),
                message: format!("root machine of {context} has nothing to exit to"),
            });
        }
    }
    Ok(())
}

fn validate_machine(data: &GraphData, index: usize, machine: &MachineData) -> Result<(), Error> {
    if machine.states.get(machine.default_state).is_none() {
        return Err(Error::UnknownState {
            machine: machine.name.clone(),
            context: "default state".to_string(),
            index: machine.default_state,
        });
    }

    for (i, transition) in machine.any_state_transitions.iter().enumerate() {
        let context = format!("any-state transition {i}");
        if transition.target == TransitionTarget::Exit {
            return Err(Error::InvalidExit {
                machine: machine.name.clone(),
                message: format!("{context} cannot target the exit"),
            });
        }
        validate_transition(data, machine, &context, transition)?;
    }

    for state in &machine.states {
        if !state.speed.is_finite() {
            return Err(invalid(format!(
                "state '{}' in machine '{}' has a non-finite speed",
                state.name, machine.name
            )));
        }
        validate_motion(data, index, machine, state)?;
        let is_node = matches!(state.motion, Motion::SubStateMachine { .. });
        for (i, transition) in state.transitions.iter().enumerate() {
            let context = format!("transition {i} of state '{}'", state.name);
            if is_node && transition.target == TransitionTarget::Exit {
                return Err(Error::InvalidExit {
                    machine: machine.name.clone(),
                    message: format!("{context} leaves a sub-machine node and cannot exit"),
                });
            }
            validate_transition(data, machine, &context, transition)?;
        }
    }
    Ok(())
}

fn validate_motion(
    data: &GraphData,
    machine_index: usize,
    machine: &MachineData,
    state: &StateData,
) -> Result<(), Error> {
    let context = format!("state '{}' in machine '{}'", state.name, machine.name);
    let blend_error = |message: String| Error::InvalidBlendTree {
        machine: machine.name.clone(),
        state: state.name.clone(),
        message,
    };

    let check_clip = |clip: Option<usize>| -> Result<(), Error> {
        match clip {
            Some(index) if data.clips.get(index).is_none() => Err(Error::UnknownClip {
                context: context.clone(),
                index,
            }),
            Some(_) => Ok(()),
            None => {
                log::warn!("{context} has no clip assigned; it will produce no samplers");
                Ok(())
            }
        }
    };

    let check_blend_parameter = |parameter: usize| -> Result<(), Error> {
        let Some(def) = data.parameters.get(parameter) else {
            return Err(Error::UnknownParameter {
                parameter: format!("index {parameter} referenced by {context}"),
            });
        };
        if def.kind() == ParameterKind::Bool {
            return Err(Error::ParameterKindMismatch {
                name: def.name.clone(),
                expected: ParameterKind::Float,
                actual: ParameterKind::Bool,
            });
        }
        Ok(())
    };

    match &state.motion {
        Motion::SingleClip { clip } => check_clip(*clip)?,
        Motion::LinearBlend1D(tree) => {
            check_blend_parameter(tree.parameter)?;
            if tree.children.is_empty() {
                log::warn!("{context} is a blend tree without children");
            }
            for child in &tree.children {
                check_clip(child.clip)?;
                if !child.threshold.is_finite() || !child.speed.is_finite() {
                    return Err(blend_error("non-finite threshold or speed".to_string()));
                }
            }
            if tree
                .children
                .windows(2)
                .any(|w| w[1].threshold < w[0].threshold)
            {
                return Err(blend_error(
                    "thresholds must be in non-decreasing order".to_string(),
                ));
            }
        }
        Motion::Directional2DBlend(tree) => {
            check_blend_parameter(tree.parameter_x)?;
            check_blend_parameter(tree.parameter_y)?;
            if tree.children.is_empty() {
                log::warn!("{context} is a blend tree without children");
            }
            for child in &tree.children {
                check_clip(child.clip)?;
                if !child.position.is_finite() || !child.speed.is_finite() {
                    return Err(blend_error("non-finite position or speed".to_string()));
                }
            }
        }
        Motion::SubStateMachine { machine: sub } => {
            if data.machines.get(*sub).is_none() {
                return Err(Error::UnknownMachine {
                    context: context.clone(),
                    index: *sub,
                });
            }
            if *sub == machine_index {
                return Err(Error::MachineCycle {
                    machine: machine.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_transition(
    data: &GraphData,
    machine: &MachineData,
    context: &str,
    transition: &TransitionData,
) -> Result<(), Error> {
    if let TransitionTarget::State(target) = transition.target {
        if machine.states.get(target).is_none() {
            return Err(Error::UnknownState {
                machine: machine.name.clone(),
                context: context.to_string(),
                index: target,
            });
        }
    }
    if !transition.duration.is_finite() || transition.duration < 0.0 {
        return Err(invalid(format!(
            "{context} in machine '{}' has an invalid duration",
            machine.name
        )));
    }
    if transition
        .exit_time
        .is_some_and(|t| !t.is_finite() || t < 0.0)
    {
        return Err(invalid(format!(
            "{context} in machine '{}' has an invalid exit time",
            machine.name
        )));
    }
    if !transition.offset.is_finite() {
        return Err(invalid(format!(
            "{context} in machine '{}' has a non-finite offset",
            machine.name
        )));
    }

    for condition in &transition.conditions {
        let Some(def) = data.parameters.get(condition.parameter) else {
            return Err(Error::UnknownParameter {
                parameter: format!(
                    "index {} referenced by {context} in machine '{}'",
                    condition.parameter, machine.name
                ),
            });
        };
        let expected = condition.test.kind();
        if def.kind() != expected {
            return Err(Error::ParameterKindMismatch {
                name: def.name.clone(),
                expected,
                actual: def.kind(),
            });
        }
    }

    match &transition.curve {
        None => {}
        Some(TransitionCurve::Complementary(curve)) => validate_curve(machine, context, curve)?,
        Some(TransitionCurve::Independent { from, to }) => {
            validate_curve(machine, context, from)?;
            validate_curve(machine, context, to)?;
        }
    }
    Ok(())
}

fn validate_curve(machine: &MachineData, context: &str, curve: &BlendCurve) -> Result<(), Error> {
    let bad = curve.keys.is_empty()
        || curve.keys.iter().any(|k| {
            !k.time.is_finite()
                || !k.value.is_finite()
                || k.in_tangent.is_nan()
                || k.out_tangent.is_nan()
        })
        || curve.keys.windows(2).any(|w| w[1].time < w[0].time);
    if bad {
        return Err(invalid(format!(
            "{context} in machine '{}' has a malformed blend curve",
            machine.name
        )));
    }
    Ok(())
}

fn validate_nesting(data: &GraphData, limit: usize) -> Result<(), Error> {
    let mut path = Vec::new();
    for layer in &data.layers {
        visit_machine(data, layer.machine, limit, &mut path)?;
    }
    Ok(())
}

fn visit_machine(
    data: &GraphData,
    machine: usize,
    limit: usize,
    path: &mut Vec<usize>,
) -> Result<(), Error> {
    let name = || data.machines[machine].name.clone();
    if path.contains(&machine) {
        return Err(Error::MachineCycle { machine: name() });
    }
    if path.len() >= limit {
        return Err(Error::NestingTooDeep {
            machine: name(),
            limit,
        });
    }

    path.push(machine);
    for state in &data.machines[machine].states {
        if let Motion::SubStateMachine { machine: sub } = state.motion {
            visit_machine(data, sub, limit, path)?;
        }
    }
    path.pop();
    Ok(())
}
