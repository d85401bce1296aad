use crate::{
    Condition, ConditionTest, FloatComparison, GraphData, IntComparison, ParameterStore,
    ParameterValue, TransitionData, TransitionTarget,
};

/// One entry of a layer's context stack.
///
/// The top frame's `state` is the playing leaf. Lower frames keep the position their machine had
/// when the frame above was entered, and `node` names the sub-machine state that led here.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    pub machine: usize,
    pub state: usize,
    pub node: Option<usize>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionSource {
    AnyState,
    State(usize),
}

/// Address of an authored transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionRef {
    pub machine: usize,
    pub source: TransitionSource,
    pub index: usize,
}

impl TransitionRef {
    pub fn resolve<'a>(&self, graph: &'a GraphData) -> Option<&'a TransitionData> {
        let machine = graph.machine(self.machine)?;
        match self.source {
            TransitionSource::AnyState => machine.any_state_transitions.get(self.index),
            TransitionSource::State(state) => machine.states.get(state)?.transitions.get(self.index),
        }
    }
}

/// The winning transition and the stack depth of the machine it belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TransitionMatch {
    pub depth: usize,
    pub transition: TransitionRef,
}

/// Picks at most one transition for this tick.
///
/// Any-State lists are checked first, outermost machine first, in declaration order; only when
/// none of them fires is the current leaf's own list checked. `normalized_time` is the current
/// leaf's accumulated normalized time, used for exit-time gates.
pub fn evaluate_transitions(
    graph: &GraphData,
    stack: &[Frame],
    normalized_time: f32,
    parameters: &ParameterStore,
) -> Option<TransitionMatch> {
    let top = stack.len().checked_sub(1)?;

    for (depth, frame) in stack.iter().enumerate() {
        let Some(machine) = graph.machine(frame.machine) else {
            continue;
        };
        let active = if depth == top {
            Some(frame.state)
        } else {
            stack[depth + 1].node
        };
        for (index, transition) in machine.any_state_transitions.iter().enumerate() {
            let targets_active = matches!(
                (transition.target, active),
                (TransitionTarget::State(target), Some(active)) if target == active
            );
            if targets_active && !transition.can_transition_to_self {
                continue;
            }
            if transition_passes(transition, normalized_time, parameters) {
                return Some(TransitionMatch {
                    depth,
                    transition: TransitionRef {
                        machine: frame.machine,
                        source: TransitionSource::AnyState,
                        index,
                    },
                });
            }
        }
    }

    let frame = stack[top];
    let state = graph.machine(frame.machine)?.states.get(frame.state)?;
    state
        .transitions
        .iter()
        .position(|t| transition_passes(t, normalized_time, parameters))
        .map(|index| TransitionMatch {
            depth: top,
            transition: TransitionRef {
                machine: frame.machine,
                source: TransitionSource::State(frame.state),
                index,
            },
        })
}

/// First outgoing transition of sub-machine node `node` whose conditions hold, checked once the
/// machine it leads into exits. Nodes have no playback of their own, so exit-time gates count as
/// reached.
pub fn evaluate_node_exit(
    graph: &GraphData,
    machine: usize,
    node: usize,
    parameters: &ParameterStore,
) -> Option<TransitionRef> {
    let state = graph.machine(machine)?.states.get(node)?;
    state
        .transitions
        .iter()
        .position(|t| {
            matches!(t.target, TransitionTarget::State(_))
                && transition_passes(t, f32::INFINITY, parameters)
        })
        .map(|index| TransitionRef {
            machine,
            source: TransitionSource::State(node),
            index,
        })
}

/// Exit-time gate and conditions. A transition with neither always passes.
pub fn transition_passes(
    transition: &TransitionData,
    normalized_time: f32,
    parameters: &ParameterStore,
) -> bool {
    if let Some(exit_time) = transition.exit_time {
        if normalized_time < exit_time {
            return false;
        }
    }
    transition
        .conditions
        .iter()
        .all(|c| condition_holds(c, parameters))
}

pub fn condition_holds(condition: &Condition, parameters: &ParameterStore) -> bool {
    let Some(value) = parameters.value(condition.parameter) else {
        return false;
    };
    match (condition.test, value) {
        (ConditionTest::Bool(expected), ParameterValue::Bool(v)) => v == expected,
        (ConditionTest::Int(cmp, threshold), ParameterValue::Int(v)) => match cmp {
            IntComparison::Greater => v > threshold,
            IntComparison::Less => v < threshold,
            IntComparison::Equal => v == threshold,
            IntComparison::NotEqual => v != threshold,
            IntComparison::GreaterOrEqual => v >= threshold,
            IntComparison::LessOrEqual => v <= threshold,
        },
        (ConditionTest::Float(cmp, threshold), ParameterValue::Float(v)) => match cmp {
            FloatComparison::Greater => v > threshold,
            FloatComparison::Less => v < threshold,
        },
        _ => false,
    }
}
