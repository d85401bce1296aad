use super::blend_tree::evaluate_motion;
use super::events::collect_events;
use super::transition_blend::{offset_start_time, sample_time, transition_weights};
use crate::{
    AnimationEvent, Config, Frame, GraphData, InFlightTransition, Motion, ParameterStore, Sampler,
    Scratch, StateRef, TransitionMatch, TransitionRef, TransitionTarget, TransitionWeights,
    evaluate_node_exit, evaluate_transitions,
};

/// States without playable content advance as if they were this long, so exit-time gates on them
/// still open.
const EMPTY_STATE_DURATION: f32 = 1.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Uninitialized,
    Steady,
    Transitioning,
}

/// Playback position of a leaf state.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Playback {
    pub state: StateRef,
    /// Accumulated normalized time; exceeds 1 once a looping state has wrapped.
    pub time: f32,
    pub last_time: f32,
    started: bool,
}

impl Playback {
    fn start(state: StateRef, time: f32) -> Self {
        Self {
            state,
            time,
            last_time: time,
            started: false,
        }
    }
}

/// Per-layer state machine evaluator.
///
/// Owns the context stack, the playing leaf and at most one in-flight transition. The graph is
/// only ever read; every index lookup is checked so a mismatched graph degrades to "no change".
#[derive(Clone, Debug)]
pub struct StateMachine {
    root: usize,
    stack: Vec<Frame>,
    current: Option<Playback>,
    transition: Option<InFlightTransition>,
}

impl StateMachine {
    pub fn new(root: usize) -> Self {
        Self {
            root,
            stack: Vec::new(),
            current: None,
            transition: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.current.is_none() {
            Phase::Uninitialized
        } else if self.transition.is_some() {
            Phase::Transitioning
        } else {
            Phase::Steady
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }

    pub fn current(&self) -> Option<&Playback> {
        self.current.as_ref()
    }

    pub fn current_state(&self) -> Option<StateRef> {
        self.current.map(|p| p.state)
    }

    pub fn transition(&self) -> Option<&InFlightTransition> {
        self.transition.as_ref()
    }

    pub fn is_in_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Drops all runtime state; the next update seeds the default state again.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = None;
        self.transition = None;
    }

    /// Advances one tick and applies at most one transition, returning it.
    ///
    /// The first call only seeds the default state. Later calls advance the playing state and any
    /// in-flight transition by `delta` seconds, then evaluate transitions against the advanced
    /// time. A transition decided here starts with zero elapsed time.
    pub fn update(
        &mut self,
        graph: &GraphData,
        parameters: &ParameterStore,
        delta: f32,
        config: &Config,
        scratch: &mut Scratch,
    ) -> Option<TransitionRef> {
        if self.current.is_none() {
            self.initialize(graph, config);
            return None;
        }

        self.advance(graph, parameters, delta, config, scratch);

        let time = self.current.map(|p| p.time)?;
        let winner = evaluate_transitions(graph, &self.stack, time, parameters)?;
        self.apply_transition(graph, parameters, winner, config)
    }

    fn initialize(&mut self, graph: &GraphData, config: &Config) {
        self.stack.clear();
        self.transition = None;
        let Some(machine) = graph.machine(self.root) else {
            log::error!("layer root machine {} does not exist", self.root);
            return;
        };
        self.stack.push(Frame {
            machine: self.root,
            state: machine.default_state,
            node: None,
        });
        self.descend(graph, config);
        self.current = self.leaf().map(|leaf| Playback::start(leaf, 0.0));
    }

    fn leaf(&self) -> Option<StateRef> {
        self.stack.last().map(|top| StateRef {
            machine: top.machine,
            state: top.state,
        })
    }

    /// While the top of the stack names a sub-machine, enters it at its default state.
    fn descend(&mut self, graph: &GraphData, config: &Config) {
        while self.stack.len() <= config.max_nesting_depth {
            let Some(top) = self.stack.last().copied() else {
                return;
            };
            let Some(state) = graph.state(StateRef {
                machine: top.machine,
                state: top.state,
            }) else {
                return;
            };
            let Motion::SubStateMachine { machine: sub } = state.motion else {
                return;
            };
            let Some(sub_machine) = graph.machine(sub) else {
                return;
            };
            self.stack.push(Frame {
                machine: sub,
                state: sub_machine.default_state,
                node: Some(top.state),
            });
        }
    }

    fn advance(
        &mut self,
        graph: &GraphData,
        parameters: &ParameterStore,
        delta: f32,
        config: &Config,
        scratch: &mut Scratch,
    ) {
        if let Some(current) = self.current.as_mut() {
            let rate = playback_rate(graph, current.state, parameters, config, scratch);
            current.last_time = current.time;
            current.time += delta * rate;
        }

        if let Some(transition) = self.transition.as_mut() {
            let rate = playback_rate(graph, transition.from, parameters, config, scratch);
            transition.from_last_time = transition.from_time;
            transition.from_time += delta * rate;
            transition.elapsed += delta;
            if transition.is_complete() {
                self.transition = None;
            }
        }
    }

    /// Returns the transition that was actually applied, or `None` when nothing changed.
    ///
    /// An exit pops the sub-machine and follows the first passing transition authored on the
    /// node that led into it. Without one the parent's remembered position resumes, unless that
    /// position is the node itself: re-entering it would restart the machine that just exited,
    /// so the exit is held back instead.
    fn apply_transition(
        &mut self,
        graph: &GraphData,
        parameters: &ParameterStore,
        winner: TransitionMatch,
        config: &Config,
    ) -> Option<TransitionRef> {
        if winner.depth >= self.stack.len() {
            return None;
        }
        let mut applied = winner.transition;
        let mut transition = applied.resolve(graph)?;
        let previous = self.current;

        match transition.target {
            TransitionTarget::State(target) => {
                if !self.enter_state(graph, winner.depth, target, config) {
                    return None;
                }
            }
            TransitionTarget::Exit => {
                if self.stack.len() < 2 || winner.depth + 1 != self.stack.len() {
                    log::debug!("ignoring exit transition outside of a sub-machine");
                    return None;
                }
                let exited = self.stack[winner.depth];
                let parent_depth = winner.depth - 1;
                let parent = self.stack[parent_depth];
                let follow = exited.node.and_then(|node| {
                    let found = evaluate_node_exit(graph, parent.machine, node, parameters)?;
                    match found.resolve(graph)?.target {
                        TransitionTarget::State(target) => Some((found, target)),
                        TransitionTarget::Exit => None,
                    }
                });
                match follow {
                    Some((found, target)) => {
                        if !self.enter_state(graph, parent_depth, target, config) {
                            return None;
                        }
                        applied = found;
                        transition = found.resolve(graph)?;
                    }
                    None if exited.node == Some(parent.state) => {
                        log::debug!(
                            "holding exit of machine {}: its node has no passing transition",
                            exited.machine
                        );
                        return None;
                    }
                    None => {
                        self.stack.pop();
                        self.descend(graph, config);
                    }
                }
            }
        }

        let leaf = self.leaf()?;
        let looped = graph.state(leaf).is_none_or(|s| s.looped);
        self.current = Some(Playback::start(
            leaf,
            offset_start_time(transition.offset, looped),
        ));
        self.transition = match previous {
            Some(previous) if transition.duration > 0.0 => Some(InFlightTransition {
                transition: applied,
                from: previous.state,
                from_time: previous.time,
                from_last_time: previous.time,
                elapsed: 0.0,
                duration: transition.duration,
            }),
            _ => None,
        };
        log::trace!(
            "transition {:?} -> machine {} state {} (stack depth {})",
            applied,
            leaf.machine,
            leaf.state,
            self.stack.len()
        );
        Some(applied)
    }

    /// Moves the machine at `depth` to `target`, entering it when `target` is a sub-machine node.
    /// Frames above `depth` are dropped. Nothing changes when the target does not resolve.
    fn enter_state(
        &mut self,
        graph: &GraphData,
        depth: usize,
        target: usize,
        config: &Config,
    ) -> bool {
        let Some(frame) = self.stack.get(depth).copied() else {
            return false;
        };
        let destination = StateRef {
            machine: frame.machine,
            state: target,
        };
        let sub = match graph.state(destination).map(|s| &s.motion) {
            Some(Motion::SubStateMachine { machine }) => match graph.machine(*machine) {
                Some(sub_machine) => Some((*machine, sub_machine.default_state)),
                None => return false,
            },
            Some(_) => None,
            None => return false,
        };

        self.stack.truncate(depth + 1);
        match sub {
            Some((machine, default_state)) => {
                self.stack.push(Frame {
                    machine,
                    state: default_state,
                    node: Some(target),
                });
                self.descend(graph, config);
            }
            None => self.stack[depth].state = target,
        }
        true
    }

    /// Current crossfade weights; `{ from: 0, to: 1 }` outside of a transition.
    pub fn transition_weights(&self, graph: &GraphData) -> TransitionWeights {
        match &self.transition {
            Some(transition) => {
                let curve = transition
                    .transition
                    .resolve(graph)
                    .and_then(|t| t.curve.as_ref());
                transition_weights(curve, transition.progress())
            }
            None => TransitionWeights { from: 0.0, to: 1.0 },
        }
    }

    /// Appends this layer's samplers (outgoing state first) and, when `events` is given, the
    /// markers the playing state crossed since the previous update.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn emit(
        &mut self,
        graph: &GraphData,
        parameters: &ParameterStore,
        layer: usize,
        mask: Option<usize>,
        config: &Config,
        scratch: &mut Scratch,
        samplers: &mut Vec<Sampler>,
        events: Option<&mut Vec<AnimationEvent>>,
    ) {
        let weights = self.transition_weights(graph);

        if let Some(transition) = self.transition {
            let source = StateSample {
                state: transition.from,
                time: transition.from_time,
                last_time: transition.from_last_time,
                weight: weights.from,
            };
            emit_state(
                graph, parameters, layer, mask, config, scratch, source, samplers, None,
            );
        }

        if let Some(current) = self.current.as_mut() {
            let source = StateSample {
                state: current.state,
                time: current.time,
                last_time: current.last_time,
                weight: weights.to,
            };
            let events = events.map(|out| (out, !current.started));
            emit_state(
                graph, parameters, layer, mask, config, scratch, source, samplers, events,
            );
            current.started = true;
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct StateSample {
    state: StateRef,
    time: f32,
    last_time: f32,
    weight: f32,
}

#[allow(clippy::too_many_arguments)]
fn emit_state(
    graph: &GraphData,
    parameters: &ParameterStore,
    layer: usize,
    mask: Option<usize>,
    config: &Config,
    scratch: &mut Scratch,
    source: StateSample,
    samplers: &mut Vec<Sampler>,
    mut events: Option<(&mut Vec<AnimationEvent>, bool)>,
) {
    let Some(state) = graph.state(source.state) else {
        return;
    };
    let mut weights = std::mem::take(&mut scratch.weights);
    evaluate_motion(
        graph,
        &state.motion,
        parameters,
        config.weight_epsilon,
        &mut scratch.blend,
        &mut weights,
    );

    let normalized_time = sample_time(source.time, state.looped);
    let previous_time = sample_time(source.last_time, state.looped);
    for (index, &child_weight) in weights.iter().enumerate() {
        if child_weight <= 0.0 {
            continue;
        }
        let Some((clip, speed)) = motion_child(&state.motion, index) else {
            continue;
        };
        let Some(clip) = clip else {
            log::trace!("state '{}' has a child without a clip", state.name);
            continue;
        };

        if let Some((out, include_start)) = events.as_mut() {
            if let Some(data) = graph.clip(clip) {
                collect_events(
                    &data.events,
                    source.last_time,
                    source.time,
                    state.looped,
                    *include_start,
                    |e| out.push(AnimationEvent::new(layer, source.state, clip, e)),
                );
            }
        }

        let weight = child_weight * source.weight;
        if weight <= 0.0 || weight <= config.min_sampler_weight {
            continue;
        }
        samplers.push(Sampler {
            clip,
            normalized_time,
            previous_time,
            weight,
            speed: speed * state.speed,
            mask,
        });
    }
    scratch.weights = weights;
}

/// Clip and speed of the `index`-th child of a leaf motion.
fn motion_child(motion: &Motion, index: usize) -> Option<(Option<usize>, f32)> {
    match motion {
        Motion::SingleClip { clip } => (index == 0).then_some((*clip, 1.0)),
        Motion::LinearBlend1D(tree) => tree.children.get(index).map(|c| (c.clip, c.speed)),
        Motion::Directional2DBlend(tree) => tree.children.get(index).map(|c| (c.clip, c.speed)),
        Motion::SubStateMachine { .. } => None,
    }
}

/// Normalized time gained per second of tick time.
fn playback_rate(
    graph: &GraphData,
    state: StateRef,
    parameters: &ParameterStore,
    config: &Config,
    scratch: &mut Scratch,
) -> f32 {
    let Some(data) = graph.state(state) else {
        return 0.0;
    };
    let playback = evaluate_motion(
        graph,
        &data.motion,
        parameters,
        config.weight_epsilon,
        &mut scratch.blend,
        &mut scratch.weights,
    );
    let duration = if playback.duration > config.weight_epsilon {
        playback.duration
    } else {
        EMPTY_STATE_DURATION
    };
    data.speed * playback.speed / duration
}
