use crate::test_graphs::*;
use crate::{
    BlendCurve, BlendMode, BlendTree1D, BoneMask, ClipData, ClipEvent, Condition, Config, Error,
    Graph, IntComparison, LayerData, MachineData, Motion, ParameterDef, ParameterId, StateData,
    TransitionCurve, TransitionData,
};

fn expect_err(data: crate::GraphData) -> Error {
    match Graph::new(data) {
        Ok(_) => panic!("expected validation to fail"),
        Err(err) => err,
    }
}

#[test]
fn accepts_a_well_formed_graph() {
    let graph = build(idle_run());
    assert_eq!(graph.machines.len(), 1);
    assert_eq!(graph.parameter_slot(ParameterId::from("Speed")), Some(SPEED));
    assert_eq!(graph.parameter_slot(ParameterId::from("Missing")), None);
}

#[test]
fn rejects_a_graph_without_layers() {
    let mut data = idle_run();
    data.layers.clear();
    assert!(matches!(expect_err(data), Error::NoLayers));
}

#[test]
fn rejects_an_additive_or_partial_base_layer() {
    let mut data = idle_run();
    data.layers[0] = LayerData::new("Base", 0).with_blend_mode(BlendMode::Additive);
    assert!(matches!(expect_err(data), Error::InvalidBaseLayer { .. }));

    let mut data = idle_run();
    data.layers[0] = LayerData::new("Base", 0).with_weight(0.5);
    assert!(matches!(expect_err(data), Error::InvalidBaseLayer { .. }));
}

#[test]
fn rejects_unknown_transition_targets() {
    let mut data = idle_run();
    data.machines[0].states[0]
        .transitions
        .push(TransitionData::to_state(7));
    match expect_err(data) {
        Error::UnknownState { index, .. } => assert_eq!(index, 7),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_unknown_clips_and_masks() {
    let mut data = idle_run();
    data.machines[0].states[1].motion = Motion::clip(42);
    assert!(matches!(
        expect_err(data),
        Error::UnknownClip { index: 42, .. }
    ));

    let mut data = idle_run();
    data.layers.push(LayerData::new("Upper", 0).with_mask(3));
    assert!(matches!(expect_err(data), Error::UnknownMask { index: 3, .. }));
}

#[test]
fn rejects_conditions_of_the_wrong_kind() {
    let mut data = idle_run();
    data.machines[0].states[0].transitions[0]
        .conditions
        .push(Condition::int(RUN, IntComparison::Equal, 1));
    match expect_err(data) {
        Error::ParameterKindMismatch { name, .. } => assert_eq!(name, "Run"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_bool_blend_parameters_and_unsorted_thresholds() {
    let mut data = idle_run();
    data.machines[0].states[0].motion =
        Motion::LinearBlend1D(BlendTree1D::new(RUN, &[(IDLE_CLIP, 0.0), (WALK_CLIP, 1.0)]));
    assert!(matches!(
        expect_err(data),
        Error::ParameterKindMismatch { .. }
    ));

    let mut data = idle_run();
    data.machines[0].states[0].motion = Motion::LinearBlend1D(BlendTree1D::new(
        SPEED,
        &[(IDLE_CLIP, 5.0), (WALK_CLIP, 1.0)],
    ));
    assert!(matches!(expect_err(data), Error::InvalidBlendTree { .. }));
}

#[test]
fn rejects_exit_from_a_root_machine_and_any_state_exit() {
    let mut data = idle_run();
    data.machines[0].states[0]
        .transitions
        .push(TransitionData::exit());
    assert!(matches!(expect_err(data), Error::InvalidExit { .. }));

    let mut data = idle_run();
    data.machines[0]
        .any_state_transitions
        .push(TransitionData::exit());
    assert!(matches!(expect_err(data), Error::InvalidExit { .. }));
}

#[test]
fn rejects_exit_transitions_on_sub_machine_nodes() {
    let mut data = idle_run();
    data.machines[0]
        .states
        .push(StateData::new("Nested", Motion::sub_machine(1)));
    data.machines.push(MachineData::new(
        "Middle",
        vec![
            StateData::new("Leaf", Motion::clip(WALK_CLIP))
                .with_transition(TransitionData::to_state(1)),
            StateData::new("Deeper", Motion::sub_machine(2)),
        ],
    ));
    data.machines.push(MachineData::new(
        "Inner",
        vec![StateData::new("Leaf", Motion::clip(IDLE_CLIP))],
    ));
    assert!(Graph::new(data.clone()).is_ok());

    data.machines[1].states[1]
        .transitions
        .push(TransitionData::exit());
    match expect_err(data) {
        Error::InvalidExit { machine, .. } => assert_eq!(machine, "Middle"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_duplicate_parameter_names() {
    let mut data = idle_run();
    data.parameters.push(ParameterDef::bool("Run", true));
    match expect_err(data) {
        Error::DuplicateParameter { name, id } => {
            assert_eq!(name, "Run");
            assert_eq!(id, ParameterId::from("Run").0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_invalid_ranges_and_durations() {
    let mut data = idle_run();
    data.parameters[SPEED] = ParameterDef::float("Speed", 0.0).with_range(5.0, 1.0);
    assert!(matches!(expect_err(data), Error::InvalidValue { .. }));

    let mut data = idle_run();
    data.clips[0] = ClipData::new("Idle", -1.0);
    assert!(matches!(expect_err(data), Error::InvalidValue { .. }));

    let mut data = idle_run();
    data.machines[0].states[0].transitions[0].duration = f32::NAN;
    assert!(matches!(expect_err(data), Error::InvalidValue { .. }));
}

#[test]
fn rejects_malformed_blend_curves() {
    let mut data = idle_run();
    data.machines[0].states[0].transitions[0].curve =
        Some(TransitionCurve::Complementary(BlendCurve::new(Vec::new())));
    assert!(matches!(expect_err(data), Error::InvalidValue { .. }));

    let mut data = idle_run();
    data.machines[0].states[0].transitions[0].curve = Some(TransitionCurve::Independent {
        from: BlendCurve::linear(1.0, 0.0),
        to: BlendCurve::linear(0.0, 1.0),
    });
    assert!(Graph::new(data).is_ok());
}

#[test]
fn rejects_sub_machine_cycles() {
    let mut data = idle_run();
    data.machines[0]
        .states
        .push(StateData::new("Nested", Motion::sub_machine(1)));
    data.machines.push(MachineData::new(
        "Inner",
        vec![StateData::new("Back", Motion::sub_machine(0))],
    ));
    assert!(matches!(expect_err(data), Error::MachineCycle { .. }));

    let mut data = idle_run();
    data.machines[0]
        .states
        .push(StateData::new("Own", Motion::sub_machine(0)));
    assert!(matches!(expect_err(data), Error::MachineCycle { .. }));
}

#[test]
fn enforces_the_nesting_limit() {
    let mut data = idle_run();
    data.machines[0]
        .states
        .push(StateData::new("Level1", Motion::sub_machine(1)));
    data.machines.push(MachineData::new(
        "Level1",
        vec![StateData::new("Level2", Motion::sub_machine(2))],
    ));
    data.machines.push(MachineData::new(
        "Level2",
        vec![StateData::new("Leaf", Motion::clip(IDLE_CLIP))],
    ));

    let shallow = Config {
        max_nesting_depth: 2,
        ..Config::default()
    };
    assert!(matches!(
        Graph::with_config(data.clone(), &shallow),
        Err(Error::NestingTooDeep { limit: 2, .. })
    ));
    assert!(Graph::new(data).is_ok());
}

#[test]
fn rejects_unsorted_clip_events() {
    let mut data = idle_run();
    data.clips[0].events = vec![ClipEvent::new("late", 0.8), ClipEvent::new("early", 0.2)];
    assert!(matches!(expect_err(data), Error::InvalidValue { .. }));

    // The builder keeps events ordered.
    let mut data = idle_run();
    data.clips[0] = ClipData::new("Idle", 1.0)
        .with_event(ClipEvent::new("late", 0.8))
        .with_event(ClipEvent::new("early", 0.2));
    let graph = build(data);
    let names: Vec<_> = graph.clips[0].events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["early", "late"]);
}

#[test]
fn accepts_states_without_content() {
    let mut data = idle_run();
    data.machines[0].states[1].motion = Motion::SingleClip { clip: None };
    data.masks.push(BoneMask::from_indices("Upper", 4, &[2, 3]));
    data.layers.push(LayerData::new("Upper", 0).with_mask(0));
    assert!(Graph::new(data).is_ok());
}
