mod animator;
mod blend_tree;
mod compose;
mod curve;
mod events;
mod parameters;
mod pose;
mod root_motion;
mod sampler;
mod state_machine;
mod transition_blend;
mod transitions;

pub use animator::*;
pub use blend_tree::{
    BlendScratch, MotionPlayback, directional_blend_weights, inverse_distance_weights,
    linear_blend_weights, simple_directional_weights,
};
pub use compose::*;
pub use events::*;
pub use parameters::*;
pub use pose::*;
pub use root_motion::*;
pub use sampler::*;
pub use state_machine::*;
pub use transition_blend::*;
pub use transitions::*;







#[cfg(test)]
mod animator_tests;
