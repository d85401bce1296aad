use crate::ParameterId;
use glam::Vec2;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ParameterValue {
    pub fn kind(self) -> ParameterKind {
        match self {
            Self::Bool(_) => ParameterKind::Bool,
            Self::Int(_) => ParameterKind::Int,
            Self::Float(_) => ParameterKind::Float,
        }
    }

    /// Numeric view used by blend trees. Bools read as 0 or 1.
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(v) => v as f32,
            Self::Float(v) => v,
        }
    }
}

/// Inclusive clamp range for Int and Float parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Clone, Debug)]
pub struct ParameterDef {
    pub name: String,
    pub default: ParameterValue,
    pub range: Option<ParameterRange>,
}

impl ParameterDef {
    pub fn bool(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            default: ParameterValue::Bool(default),
            range: None,
        }
    }

    pub fn int(name: &str, default: i32) -> Self {
        Self {
            name: name.to_string(),
            default: ParameterValue::Int(default),
            range: None,
        }
    }

    pub fn float(name: &str, default: f32) -> Self {
        Self {
            name: name.to_string(),
            default: ParameterValue::Float(default),
            range: None,
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = Some(ParameterRange { min, max });
        self
    }

    pub fn id(&self) -> ParameterId {
        ParameterId::from_name(&self.name)
    }

    pub fn kind(&self) -> ParameterKind {
        self.default.kind()
    }
}

/// A marker authored on a clip, at a normalized time in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipEvent {
    pub time: f32,
    pub name: String,
    pub int_value: i32,
    pub float_value: f32,
    pub string: String,
}

impl ClipEvent {
    pub fn new(name: &str, time: f32) -> Self {
        Self {
            time,
            name: name.to_string(),
            int_value: 0,
            float_value: 0.0,
            string: String::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClipData {
    pub name: String,
    /// Length in seconds at speed 1.
    pub duration: f32,
    /// Sorted by time.
    pub events: Vec<ClipEvent>,
}

impl ClipData {
    pub fn new(name: &str, duration: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: ClipEvent) -> Self {
        let index = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(index, event);
        self
    }
}

/// Per-bone inclusion set. Bones past the end of `bones` are excluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoneMask {
    pub name: String,
    pub bones: Vec<bool>,
}

impl BoneMask {
    pub fn from_indices(name: &str, bone_count: usize, included: &[usize]) -> Self {
        let mut bones = vec![false; bone_count];
        for &i in included {
            if let Some(b) = bones.get_mut(i) {
                *b = true;
            }
        }
        Self {
            name: name.to_string(),
            bones,
        }
    }

    #[inline]
    pub fn contains(&self, bone: usize) -> bool {
        self.bones.get(bone).copied().unwrap_or(false)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    #[default]
    Override,
    Additive,
}

#[derive(Clone, Debug)]
pub struct LayerData {
    pub name: String,
    /// Root machine of this layer.
    pub machine: usize,
    pub weight: f32,
    pub blend_mode: BlendMode,
    pub mask: Option<usize>,
}

impl LayerData {
    pub fn new(name: &str, machine: usize) -> Self {
        Self {
            name: name.to_string(),
            machine,
            weight: 1.0,
            blend_mode: BlendMode::Override,
            mask: None,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_mask(mut self, mask: usize) -> Self {
        self.mask = Some(mask);
        self
    }
}

#[derive(Clone, Debug)]
pub struct MachineData {
    pub name: String,
    pub states: Vec<StateData>,
    pub any_state_transitions: Vec<TransitionData>,
    pub default_state: usize,
}

impl MachineData {
    pub fn new(name: &str, states: Vec<StateData>) -> Self {
        Self {
            name: name.to_string(),
            states,
            any_state_transitions: Vec::new(),
            default_state: 0,
        }
    }

    pub fn with_default_state(mut self, state: usize) -> Self {
        self.default_state = state;
        self
    }

    pub fn with_any_state_transition(mut self, transition: TransitionData) -> Self {
        self.any_state_transitions.push(transition);
        self
    }

    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct StateData {
    pub name: String,
    pub motion: Motion,
    pub speed: f32,
    pub looped: bool,
    pub transitions: Vec<TransitionData>,
}

impl StateData {
    pub fn new(name: &str, motion: Motion) -> Self {
        Self {
            name: name.to_string(),
            motion,
            speed: 1.0,
            looped: true,
            transitions: Vec::new(),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn with_transition(mut self, transition: TransitionData) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn is_sub_machine(&self) -> bool {
        matches!(self.motion, Motion::SubStateMachine { .. })
    }
}

#[derive(Clone, Debug)]
pub enum Motion {
    /// `None` is authored-but-unset content: the state plays nothing.
    SingleClip { clip: Option<usize> },
    LinearBlend1D(BlendTree1D),
    Directional2DBlend(BlendTree2D),
    SubStateMachine { machine: usize },
}

impl Motion {
    pub fn clip(clip: usize) -> Self {
        Self::SingleClip { clip: Some(clip) }
    }

    pub fn sub_machine(machine: usize) -> Self {
        Self::SubStateMachine { machine }
    }
}

#[derive(Clone, Debug)]
pub struct BlendChild1D {
    pub clip: Option<usize>,
    pub threshold: f32,
    pub speed: f32,
}

/// Children are ordered by non-decreasing threshold.
#[derive(Clone, Debug)]
pub struct BlendTree1D {
    pub parameter: usize,
    pub children: Vec<BlendChild1D>,
}

impl BlendTree1D {
    pub fn new(parameter: usize, children: &[(usize, f32)]) -> Self {
        Self {
            parameter,
            children: children
                .iter()
                .map(|&(clip, threshold)| BlendChild1D {
                    clip: Some(clip),
                    threshold,
                    speed: 1.0,
                })
                .collect(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Blend2DAlgorithm {
    #[default]
    SimpleDirectional,
    InverseDistance,
}

#[derive(Clone, Debug)]
pub struct BlendChild2D {
    pub clip: Option<usize>,
    pub position: Vec2,
    pub speed: f32,
}

#[derive(Clone, Debug)]
pub struct BlendTree2D {
    pub parameter_x: usize,
    pub parameter_y: usize,
    pub algorithm: Blend2DAlgorithm,
    pub children: Vec<BlendChild2D>,
}

impl BlendTree2D {
    pub fn new(
        parameter_x: usize,
        parameter_y: usize,
        algorithm: Blend2DAlgorithm,
        children: &[(usize, Vec2)],
    ) -> Self {
        Self {
            parameter_x,
            parameter_y,
            algorithm,
            children: children
                .iter()
                .map(|&(clip, position)| BlendChild2D {
                    clip: Some(clip),
                    position,
                    speed: 1.0,
                })
                .collect(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransitionTarget {
    State(usize),
    /// Leave the enclosing sub-machine and resume the parent where it entered.
    Exit,
}

#[derive(Clone, Debug)]
pub struct TransitionData {
    pub target: TransitionTarget,
    /// Crossfade length in seconds.
    pub duration: f32,
    /// Minimum normalized time of the current state before the transition may fire.
    pub exit_time: Option<f32>,
    /// Normalized start time of the destination.
    pub offset: f32,
    pub conditions: Vec<Condition>,
    /// Only consulted for Any-State transitions.
    pub can_transition_to_self: bool,
    pub curve: Option<TransitionCurve>,
}

impl TransitionData {
    pub fn to_state(state: usize) -> Self {
        Self::new(TransitionTarget::State(state))
    }

    pub fn exit() -> Self {
        Self::new(TransitionTarget::Exit)
    }

    fn new(target: TransitionTarget) -> Self {
        Self {
            target,
            duration: 0.0,
            exit_time: None,
            offset: 0.0,
            conditions: Vec::new(),
            can_transition_to_self: false,
            curve: None,
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_exit_time(mut self, exit_time: f32) -> Self {
        self.exit_time = Some(exit_time);
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_curve(mut self, curve: TransitionCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_self_transition(mut self, allowed: bool) -> Self {
        self.can_transition_to_self = allowed;
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntComparison {
    Greater,
    Less,
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FloatComparison {
    Greater,
    Less,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ConditionTest {
    /// Passes when the bool parameter equals the value ("Is" for `true`, "IsNot" for `false`).
    Bool(bool),
    Int(IntComparison, i32),
    Float(FloatComparison, f32),
}

impl ConditionTest {
    pub fn kind(self) -> ParameterKind {
        match self {
            Self::Bool(_) => ParameterKind::Bool,
            Self::Int(..) => ParameterKind::Int,
            Self::Float(..) => ParameterKind::Float,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Condition {
    /// Index into `GraphData::parameters`.
    pub parameter: usize,
    pub test: ConditionTest,
}

impl Condition {
    pub fn is(parameter: usize) -> Self {
        Self {
            parameter,
            test: ConditionTest::Bool(true),
        }
    }

    pub fn is_not(parameter: usize) -> Self {
        Self {
            parameter,
            test: ConditionTest::Bool(false),
        }
    }

    pub fn int(parameter: usize, comparison: IntComparison, value: i32) -> Self {
        Self {
            parameter,
            test: ConditionTest::Int(comparison, value),
        }
    }

    pub fn float(parameter: usize, comparison: FloatComparison, value: f32) -> Self {
        Self {
            parameter,
            test: ConditionTest::Float(comparison, value),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

/// Keyframed curve over transition progress `[0, 1]`. Keys are ordered by time.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendCurve {
    pub keys: Vec<CurveKey>,
}

impl BlendCurve {
    pub fn new(keys: Vec<CurveKey>) -> Self {
        Self { keys }
    }

    /// Straight line from `(0, from)` to `(1, to)`.
    pub fn linear(from: f32, to: f32) -> Self {
        let slope = to - from;
        Self {
            keys: vec![
                CurveKey::new(0.0, from).with_tangents(slope, slope),
                CurveKey::new(1.0, to).with_tangents(slope, slope),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransitionCurve {
    /// The curve drives the outgoing weight; the incoming weight is `1 - from`.
    Complementary(BlendCurve),
    /// Each side follows its own curve; the pair is not normalized.
    Independent { from: BlendCurve, to: BlendCurve },
}

/// Editable graph content as handed over by the bake step. Validate it with `Graph::new`.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    pub parameters: Vec<ParameterDef>,
    pub clips: Vec<ClipData>,
    pub masks: Vec<BoneMask>,
    pub machines: Vec<MachineData>,
    pub layers: Vec<LayerData>,
}

/// Address of a state in the flattened machine arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct StateRef {
    pub machine: usize,
    pub state: usize,
}

impl GraphData {
    pub fn machine(&self, index: usize) -> Option<&MachineData> {
        self.machines.get(index)
    }

    pub fn state(&self, state: StateRef) -> Option<&StateData> {
        self.machines.get(state.machine)?.states.get(state.state)
    }

    pub fn clip(&self, index: usize) -> Option<&ClipData> {
        self.clips.get(index)
    }

    pub fn mask(&self, index: usize) -> Option<&BoneMask> {
        self.masks.get(index)
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }
}
