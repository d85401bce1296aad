//! Small hand-built graphs shared by the test modules.

use crate::{
    ClipData, Condition, Graph, GraphData, LayerData, MachineData, Motion, ParameterDef,
    StateData, TransitionData,
};
use std::sync::Arc;

pub(crate) const RUN: usize = 0;
pub(crate) const SPEED: usize = 1;
pub(crate) const MODE: usize = 2;

pub(crate) const IDLE_CLIP: usize = 0;
pub(crate) const WALK_CLIP: usize = 1;
pub(crate) const RUN_CLIP: usize = 2;

pub(crate) fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

pub(crate) fn parameters() -> Vec<ParameterDef> {
    vec![
        ParameterDef::bool("Run", false),
        ParameterDef::float("Speed", 0.0).with_range(0.0, 10.0),
        ParameterDef::int("Mode", 0),
    ]
}

/// Idle 1s, Walk 1s, Run 0.5s.
pub(crate) fn clips() -> Vec<ClipData> {
    vec![
        ClipData::new("Idle", 1.0),
        ClipData::new("Walk", 1.0),
        ClipData::new("Run", 0.5),
    ]
}

pub(crate) fn single_machine(machine: MachineData) -> GraphData {
    GraphData {
        parameters: parameters(),
        clips: clips(),
        masks: Vec::new(),
        machines: vec![machine],
        layers: vec![LayerData::new("Base", 0)],
    }
}

pub(crate) fn build(data: GraphData) -> Arc<Graph> {
    match Graph::new(data) {
        Ok(graph) => graph,
        Err(err) => panic!("test graph failed validation: {err}"),
    }
}

/// Idle --Run (0.2s)--> Running --!Run (0.2s)--> Idle.
pub(crate) fn idle_run() -> GraphData {
    single_machine(MachineData::new(
        "Locomotion",
        vec![
            StateData::new("Idle", Motion::clip(IDLE_CLIP)).with_transition(
                TransitionData::to_state(1)
                    .with_duration(0.2)
                    .when(Condition::is(RUN)),
            ),
            StateData::new("Running", Motion::clip(RUN_CLIP)).with_transition(
                TransitionData::to_state(0)
                    .with_duration(0.2)
                    .when(Condition::is_not(RUN)),
            ),
        ],
    ))
}
