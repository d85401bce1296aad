use crate::test_graphs::*;
use crate::{
    Animator, BlendMode, BoneMask, ClipData, ClipEvent, Config, Error, GraphData, LayerData,
    ParameterId, Phase, update_animators,
};

/// Base locomotion layer plus an upper-body override layer reusing the same machine.
fn two_layers() -> GraphData {
    let mut data = idle_run();
    data.masks.push(BoneMask::from_indices("Upper", 4, &[2, 3]));
    data.layers.push(
        LayerData::new("Upper", 0)
            .with_weight(0.5)
            .with_mask(0),
    );
    data
}

#[test]
fn update_reports_every_enabled_layer_in_order() {
    let mut animator = Animator::new(build(two_layers()));
    let output = animator.update(0.0);
    assert_eq!(output.layers.len(), 2);
    assert_eq!(output.layers[0].layer, 0);
    assert_eq!(output.layers[1].layer, 1);
    assert_approx(output.layers[1].weight, 0.5);
    assert_eq!(output.layers[1].mask, Some(0));
    assert_eq!(output.layers[1].samplers[0].mask, Some(0));
    assert_eq!(animator.current_state_name(0), Some("Idle"));
    assert_eq!(animator.phase(1), Some(Phase::Steady));
}

#[test]
fn run_flag_by_name_starts_the_transition() {
    let mut animator = Animator::new(build(idle_run()));
    animator.update(0.016);
    animator.set_bool("Run", true).unwrap();
    animator.update(0.016);

    let transition = animator.transition(0).expect("transition in flight");
    assert_approx(transition.duration, 0.2);
    assert_approx(transition.elapsed, 0.0);
    assert!(animator.is_in_transition(0));
    assert_eq!(animator.current_state_name(0), Some("Running"));
    assert!(animator.transition_ref(0).is_some());
}

#[test]
fn setters_accept_baked_hashes() {
    let mut animator = Animator::new(build(idle_run()));
    let run: u32 = ParameterId::from_name("Run").0;
    animator.set_bool(run, true).unwrap();
    assert_eq!(animator.parameters().get_bool("Run".into()), Some(true));
    assert!(matches!(
        animator.set_float(0xdead_beef_u32, 1.0),
        Err(Error::UnknownParameter { .. })
    ));
}

#[test]
fn base_layer_settings_are_pinned() {
    let mut animator = Animator::new(build(two_layers()));
    animator.set_layer_weight(0, 0.25).unwrap();
    animator.set_layer_enabled(0, false).unwrap();
    animator.set_layer_blend_mode(0, BlendMode::Additive).unwrap();

    assert_eq!(animator.layer_weight(0), Some(1.0));
    assert_eq!(animator.is_layer_enabled(0), Some(true));
    assert_eq!(animator.layer_blend_mode(0), Some(BlendMode::Override));
}

#[test]
fn other_layers_can_be_adjusted() {
    let mut animator = Animator::new(build(two_layers()));
    animator.set_layer_weight(1, 2.0).unwrap();
    assert_eq!(animator.layer_weight(1), Some(1.0));
    animator.set_layer_weight(1, f32::NAN).unwrap();
    assert_eq!(animator.layer_weight(1), Some(1.0));
    animator.set_layer_weight(1, 0.3).unwrap();
    assert_eq!(animator.layer_weight(1), Some(0.3));

    animator.set_layer_blend_mode(1, BlendMode::Additive).unwrap();
    assert_eq!(animator.layer_blend_mode(1), Some(BlendMode::Additive));

    animator.set_layer_mask(1, None).unwrap();
    assert_eq!(animator.layer_mask(1), Some(None));
    assert!(matches!(
        animator.set_layer_mask(1, Some(9)),
        Err(Error::UnknownMask { index: 9, .. })
    ));
}

#[test]
fn invalid_layer_indices_are_errors() {
    let mut animator = Animator::new(build(idle_run()));
    assert!(matches!(
        animator.set_layer_weight(3, 0.5),
        Err(Error::InvalidLayerIndex { index: 3 })
    ));
    assert!(matches!(
        animator.set_layer_enabled(3, true),
        Err(Error::InvalidLayerIndex { index: 3 })
    ));
    assert_eq!(animator.layer_weight(3), None);
    assert_eq!(animator.current_state(3), None);
    assert!(!animator.is_in_transition(3));
}

#[test]
fn disabled_layers_are_not_ticked() {
    let mut animator = Animator::new(build(two_layers()));
    animator.update(0.0);
    animator.set_layer_enabled(1, false).unwrap();
    animator.update(0.5);

    let output = animator.output();
    assert_eq!(output.layers.len(), 1);
    assert_eq!(output.layers[0].layer, 0);
    let base = animator.layer(0).unwrap().machine().current().unwrap().time;
    let upper = animator.layer(1).unwrap().machine().current().unwrap().time;
    assert_approx(base, 0.5);
    assert_approx(upper, 0.0);

    animator.set_layer_enabled(1, true).unwrap();
    animator.update(0.25);
    assert_eq!(animator.output().layers.len(), 2);
    let upper = animator.layer(1).unwrap().machine().current().unwrap().time;
    assert_approx(upper, 0.25);
}

#[test]
fn steady_updates_reuse_the_sampler_buffers() {
    let mut animator = Animator::new(build(two_layers()));
    animator.update(0.0);
    animator.update(0.1);
    let buffers: Vec<_> = animator
        .output()
        .layers
        .iter()
        .map(|l| l.samplers.as_ptr())
        .collect();

    for _ in 0..3 {
        animator.update(0.1);
        let again: Vec<_> = animator
            .output()
            .layers
            .iter()
            .map(|l| l.samplers.as_ptr())
            .collect();
        assert_eq!(again, buffers);
    }
    assert_eq!(animator.output().layers[1].layer, 1);
    assert_eq!(animator.output().layers[1].samplers.len(), 1);
}

#[test]
fn negative_and_non_finite_deltas_count_as_zero() {
    let mut animator = Animator::new(build(idle_run()));
    animator.update(0.0);
    animator.update(0.2);
    animator.update(-1.0);
    animator.update(f32::NAN);
    let time = animator.layer(0).unwrap().machine().current().unwrap().time;
    assert_approx(time, 0.2);
}

#[test]
fn events_can_be_switched_off() {
    let mut data = idle_run();
    data.clips[IDLE_CLIP] = ClipData::new("Idle", 1.0).with_event(ClipEvent::new("step", 0.5));

    let mut animator = Animator::new(build(data.clone()));
    animator.update(0.0);
    let events = &animator.update(0.6).events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "step");
    assert_eq!(events[0].layer, 0);
    assert_eq!(events[0].clip, IDLE_CLIP);

    let config = Config {
        collect_events: false,
        ..Config::default()
    };
    let mut quiet = Animator::with_config(build(data), config);
    quiet.update(0.0);
    assert!(quiet.update(0.6).events.is_empty());
}

#[test]
fn fading_out_clips_report_no_events() {
    let mut data = idle_run();
    data.clips[IDLE_CLIP] = ClipData::new("Idle", 1.0).with_event(ClipEvent::new("step", 0.5));
    let mut animator = Animator::new(build(data));
    animator.update(0.0);
    animator.update(0.4);
    animator.set_bool("Run", true).unwrap();
    animator.update(0.0);
    assert!(animator.is_in_transition(0));

    // Idle crosses its marker while fading out.
    let output = animator.update(0.15);
    assert!(output.samplers().any(|s| s.clip == IDLE_CLIP));
    assert!(output.events.is_empty());
    let from_time = animator.transition(0).unwrap().from_time;
    assert_approx(from_time, 0.55);
}

#[test]
fn reset_restores_defaults_and_reseeds() {
    let mut animator = Animator::new(build(idle_run()));
    animator.update(0.0);
    animator.set_bool("Run", true).unwrap();
    animator.update(0.1);
    animator.reset();
    assert_eq!(animator.phase(0), Some(Phase::Uninitialized));
    assert_eq!(animator.parameters().get_bool("Run".into()), Some(false));
    animator.update(0.1);
    assert_eq!(animator.current_state_name(0), Some("Idle"));
}

#[test]
fn parallel_batch_matches_sequential_updates() {
    let graph = build(two_layers());
    let mut parallel: Vec<Animator> = (0..32)
        .map(|i| {
            let mut animator = Animator::new(graph.clone());
            animator.set_float("Speed", i as f32 * 0.3).unwrap();
            animator
        })
        .collect();
    let mut sequential = parallel.clone();

    for tick in 0..20 {
        if tick == 5 {
            for (i, (a, b)) in parallel.iter_mut().zip(sequential.iter_mut()).enumerate() {
                if i % 3 == 0 {
                    a.set_bool("Run", true).unwrap();
                    b.set_bool("Run", true).unwrap();
                }
            }
        }
        update_animators(&mut parallel, 1.0 / 30.0);
        for animator in &mut sequential {
            animator.update(1.0 / 30.0);
        }
    }

    for (a, b) in parallel.iter().zip(&sequential) {
        assert_eq!(a.output(), b.output());
        assert_eq!(a.current_state(0), b.current_state(0));
        assert_eq!(a.context_stack(1), b.context_stack(1));
    }
}
