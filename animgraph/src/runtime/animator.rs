use crate::{
    AnimatorOutput, BlendMode, Config, Error, Frame, Graph, GraphData, InFlightTransition,
    LayerOutput, ParameterId, ParameterStore, Phase, Scratch, StateMachine, StateRef,
    TransitionRef,
};
use rayon::prelude::*;
use std::sync::Arc;

/// Runtime settings and evaluator of one layer.
#[derive(Clone, Debug)]
pub struct LayerState {
    pub(crate) machine: StateMachine,
    weight: f32,
    blend_mode: BlendMode,
    mask: Option<usize>,
    enabled: bool,
}

impl LayerState {
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn mask(&self) -> Option<usize> {
        self.mask
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// One animated instance: a parameter store and one state machine per layer over a shared graph.
///
/// Call [`Animator::update`] once per tick. The returned [`AnimatorOutput`] lists the samplers
/// of every enabled layer (in layer order) and the clip events crossed during the tick.
#[derive(Clone, Debug)]
pub struct Animator {
    graph: Arc<Graph>,
    config: Config,
    parameters: ParameterStore,
    layers: Vec<LayerState>,
    output: AnimatorOutput,
    scratch: Scratch,
}

impl Animator {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self::with_config(graph, Config::default())
    }

    pub fn with_config(graph: Arc<Graph>, config: Config) -> Self {
        let layers = graph
            .layers
            .iter()
            .map(|layer| LayerState {
                machine: StateMachine::new(layer.machine),
                weight: layer.weight,
                blend_mode: layer.blend_mode,
                mask: layer.mask,
                enabled: true,
            })
            .collect();
        Self {
            parameters: ParameterStore::new(Arc::clone(&graph)),
            graph,
            config,
            layers,
            output: AnimatorOutput::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.parameters
    }

    pub fn set_bool(&mut self, id: impl Into<ParameterId>, value: bool) -> Result<(), Error> {
        self.parameters.set_bool(id.into(), value)
    }

    pub fn set_int(&mut self, id: impl Into<ParameterId>, value: i32) -> Result<(), Error> {
        self.parameters.set_int(id.into(), value)
    }

    pub fn set_float(&mut self, id: impl Into<ParameterId>, value: f32) -> Result<(), Error> {
        self.parameters.set_float(id.into(), value)
    }

    /// Restores parameter defaults and sends every layer back to its default state on the next
    /// update.
    pub fn reset(&mut self) {
        self.parameters.reset();
        for layer in &mut self.layers {
            layer.machine.reset();
        }
        self.output.clear();
    }

    /// Advances every enabled layer by `delta` seconds and rebuilds the output.
    ///
    /// Negative or non-finite deltas count as zero. The first update of a layer only enters its
    /// default state.
    pub fn update(&mut self, delta: f32) -> &AnimatorOutput {
        let delta = if delta.is_finite() && delta > 0.0 {
            delta
        } else {
            if delta != 0.0 {
                log::debug!("clamping tick delta {delta} to 0");
            }
            0.0
        };

        let Self {
            graph,
            config,
            parameters,
            layers,
            output,
            scratch,
        } = self;
        let graph: &GraphData = graph.data();

        // Layer slots keep their sampler buffers from the previous update.
        output.events.clear();
        let mut used = 0;
        for (index, layer) in layers.iter_mut().enumerate() {
            if !layer.enabled {
                continue;
            }
            layer
                .machine
                .update(graph, parameters, delta, config, scratch);

            if used == output.layers.len() {
                output.layers.push(LayerOutput::default());
            }
            let slot = &mut output.layers[used];
            used += 1;
            slot.layer = index;
            slot.weight = layer.weight;
            slot.blend_mode = layer.blend_mode;
            slot.mask = layer.mask;
            slot.samplers.clear();

            let events = if config.collect_events {
                Some(&mut output.events)
            } else {
                None
            };
            layer.machine.emit(
                graph,
                parameters,
                index,
                layer.mask,
                config,
                scratch,
                &mut slot.samplers,
                events,
            );
        }
        output.layers.truncate(used);
        &self.output
    }

    /// Output of the last update.
    pub fn output(&self) -> &AnimatorOutput {
        &self.output
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, layer: usize) -> Option<&LayerState> {
        self.layers.get(layer)
    }

    pub fn current_state(&self, layer: usize) -> Option<StateRef> {
        self.layers.get(layer)?.machine.current_state()
    }

    pub fn current_state_name(&self, layer: usize) -> Option<&str> {
        let state = self.current_state(layer)?;
        self.graph.state(state).map(|s| s.name.as_str())
    }

    pub fn phase(&self, layer: usize) -> Option<Phase> {
        self.layers.get(layer).map(|l| l.machine.phase())
    }

    pub fn is_in_transition(&self, layer: usize) -> bool {
        self.layers
            .get(layer)
            .is_some_and(|l| l.machine.is_in_transition())
    }

    pub fn transition(&self, layer: usize) -> Option<&InFlightTransition> {
        self.layers.get(layer)?.machine.transition()
    }

    pub fn transition_ref(&self, layer: usize) -> Option<TransitionRef> {
        self.transition(layer).map(|t| t.transition)
    }

    /// Machine/state frames from the layer's root machine down to the playing leaf.
    pub fn context_stack(&self, layer: usize) -> Option<&[Frame]> {
        self.layers.get(layer).map(|l| l.machine.stack())
    }

    pub fn layer_weight(&self, layer: usize) -> Option<f32> {
        self.layers.get(layer).map(|l| l.weight)
    }

    /// Sets a layer's weight, clamped to `[0, 1]`. The base layer keeps weight 1.
    pub fn set_layer_weight(&mut self, layer: usize, weight: f32) -> Result<(), Error> {
        let state = self.layer_mut(layer)?;
        if layer == 0 {
            log::debug!("ignoring weight change of the base layer");
            return Ok(());
        }
        if !weight.is_finite() {
            log::debug!("ignoring non-finite weight for layer {layer}");
            return Ok(());
        }
        let clamped = weight.clamp(0.0, 1.0);
        if clamped != weight {
            log::debug!("layer {layer} weight clamped from {weight} to {clamped}");
        }
        state.weight = clamped;
        Ok(())
    }

    pub fn is_layer_enabled(&self, layer: usize) -> Option<bool> {
        self.layers.get(layer).map(|l| l.enabled)
    }

    /// Disabled layers are not ticked and contribute nothing. The base layer is always enabled.
    pub fn set_layer_enabled(&mut self, layer: usize, enabled: bool) -> Result<(), Error> {
        let state = self.layer_mut(layer)?;
        if layer == 0 {
            log::debug!("ignoring enable change of the base layer");
            return Ok(());
        }
        state.enabled = enabled;
        Ok(())
    }

    pub fn layer_blend_mode(&self, layer: usize) -> Option<BlendMode> {
        self.layers.get(layer).map(|l| l.blend_mode)
    }

    /// The base layer always overrides.
    pub fn set_layer_blend_mode(&mut self, layer: usize, mode: BlendMode) -> Result<(), Error> {
        let state = self.layer_mut(layer)?;
        if layer == 0 {
            log::debug!("ignoring blend mode change of the base layer");
            return Ok(());
        }
        state.blend_mode = mode;
        Ok(())
    }

    pub fn layer_mask(&self, layer: usize) -> Option<Option<usize>> {
        self.layers.get(layer).map(|l| l.mask)
    }

    pub fn set_layer_mask(&mut self, layer: usize, mask: Option<usize>) -> Result<(), Error> {
        if let Some(index) = mask {
            if self.graph.mask(index).is_none() {
                return Err(Error::UnknownMask {
                    context: format!("layer {layer}"),
                    index,
                });
            }
        }
        self.layer_mut(layer)?.mask = mask;
        Ok(())
    }

    fn layer_mut(&mut self, layer: usize) -> Result<&mut LayerState, Error> {
        self.layers
            .get_mut(layer)
            .ok_or(Error::InvalidLayerIndex { index: layer })
    }
}

/// Updates a batch of independent animators in parallel. Each animator is touched by exactly one
/// worker, so the result matches updating them one after another.
pub fn update_animators(animators: &mut [Animator], delta: f32) {
    animators.par_iter_mut().for_each(|animator| {
        animator.update(delta);
    });
}
