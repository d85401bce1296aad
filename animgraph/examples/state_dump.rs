use animgraph::{
    Animator, BlendTree1D, ClipData, ClipEvent, Condition, Config, Graph, GraphData, LayerData,
    MachineData, Motion, ParameterDef, StateData, TransitionData,
};
use std::sync::Arc;

fn print_usage_and_exit() -> ! {
    eprintln!(
        "Usage:\n  state_dump <commands...>\n\nCommands:\n  --config <file.json>\n  --set-bool <name> <0|1>\n  --set-int <name> <value>\n  --set-float <name> <value>\n  --layer-weight <layer> <weight>\n  --step <dt>\n"
    );
    std::process::exit(2);
}

/// Locomotion blend with a nested jump machine. Falling exits back into `move` once grounded.
fn demo_graph() -> GraphData {
    let speed = 0;
    let grounded = 1;
    let jump = 2;
    GraphData {
        parameters: vec![
            ParameterDef::float("Speed", 0.0).with_range(0.0, 6.0),
            ParameterDef::bool("Grounded", true),
            ParameterDef::bool("Jump", false),
        ],
        clips: vec![
            ClipData::new("idle", 2.0),
            ClipData::new("walk", 1.0)
                .with_event(ClipEvent::new("footstep", 0.25))
                .with_event(ClipEvent::new("footstep", 0.75)),
            ClipData::new("run", 0.6)
                .with_event(ClipEvent::new("footstep", 0.2))
                .with_event(ClipEvent::new("footstep", 0.7)),
            ClipData::new("jump_up", 0.4),
            ClipData::new("fall", 0.8),
        ],
        masks: Vec::new(),
        machines: vec![
            MachineData::new(
                "locomotion",
                vec![
                    StateData::new(
                        "move",
                        Motion::LinearBlend1D(BlendTree1D::new(
                            speed,
                            &[(0, 0.0), (1, 1.5), (2, 6.0)],
                        )),
                    )
                    .with_transition(
                        TransitionData::to_state(1)
                            .with_duration(0.1)
                            .when(Condition::is(jump)),
                    ),
                    StateData::new("airborne", Motion::sub_machine(1)),
                ],
            ),
            MachineData::new(
                "air",
                vec![
                    StateData::new("up", Motion::clip(3))
                        .with_looped(false)
                        .with_transition(TransitionData::to_state(1).with_exit_time(1.0)),
                    StateData::new("fall", Motion::clip(4)).with_transition(
                        TransitionData::exit()
                            .with_duration(0.15)
                            .when(Condition::is(grounded)),
                    ),
                ],
            ),
        ],
        layers: vec![LayerData::new("base", 0)],
    }
}

fn parse<T: std::str::FromStr>(value: Option<&String>) -> T {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| print_usage_and_exit())
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        print_usage_and_exit();
    }

    let mut config = Config::default();
    if let (Some(flag), Some(path)) = (args.first(), args.get(1)) {
        if flag == "--config" {
            let text = std::fs::read_to_string(path).expect("read config");
            config = Config::from_json_str(&text).expect("parse config");
        }
    }

    let graph: Arc<Graph> = Graph::with_config(demo_graph(), &config).expect("valid demo graph");
    let mut animator = Animator::with_config(graph, config);
    animator.update(0.0);

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => i += 2,
            "--set-bool" => {
                let name = args.get(i + 1).unwrap_or_else(|| print_usage_and_exit());
                let value: i32 = parse(args.get(i + 2));
                animator.set_bool(name.as_str(), value != 0).expect("set bool");
                i += 3;
            }
            "--set-int" => {
                let name = args.get(i + 1).unwrap_or_else(|| print_usage_and_exit());
                animator
                    .set_int(name.as_str(), parse(args.get(i + 2)))
                    .expect("set int");
                i += 3;
            }
            "--set-float" => {
                let name = args.get(i + 1).unwrap_or_else(|| print_usage_and_exit());
                animator
                    .set_float(name.as_str(), parse(args.get(i + 2)))
                    .expect("set float");
                i += 3;
            }
            "--layer-weight" => {
                let layer: usize = parse(args.get(i + 1));
                animator
                    .set_layer_weight(layer, parse(args.get(i + 2)))
                    .expect("set layer weight");
                i += 3;
            }
            "--step" => {
                let dt: f32 = parse(args.get(i + 1));
                animator.update(dt);
                println!("{}", animator.snapshot().to_json().expect("serialize snapshot"));
                i += 2;
            }
            _ => print_usage_and_exit(),
        }
    }
}
