//! Runtime evaluation of layered, hierarchical animation state machines.
//!
//! The crate decides, per tick and per animated instance, which clips play, at which normalized
//! times and with which weights. Pose sampling is left to the caller through [`ClipSampler`];
//! [`Compositor`] merges the sampled layer poses and reports root motion.
//!
//! A typical setup validates authored [`GraphData`] once with [`Graph::new`], shares the
//! resulting `Arc<Graph>` between any number of [`Animator`]s, and calls [`Animator::update`]
//! (or [`update_animators`] for a batch) every frame.

#![forbid(unsafe_code)]

mod config;
mod error;
mod graph;
mod ids;
mod model;
mod runtime;

#[cfg(feature = "json")]
mod snapshot;

pub use config::*;
pub use error::*;
pub use graph::*;
pub use ids::*;
pub use model::*;
pub use runtime::*;

#[cfg(feature = "json")]
pub use snapshot::*;

#[cfg(test)]
mod test_graphs;

#[cfg(test)]
mod graph_tests;
