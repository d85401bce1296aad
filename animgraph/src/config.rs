//! Evaluation settings shared by graph validation and the per-tick runtime.

/// Tunables for validation and evaluation. The defaults suit typical locomotion rigs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct Config {
    /// Deepest sub-machine nesting `Graph::new` accepts, counted from a layer's root machine.
    pub max_nesting_depth: usize,
    /// Distances, spans and weight totals at or below this are treated as zero.
    pub weight_epsilon: f32,
    /// Samplers whose final weight falls at or below this are dropped from the output.
    pub min_sampler_weight: f32,
    /// Collect authored clip events while advancing time.
    pub collect_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_nesting_depth: 8,
            weight_epsilon: 1.0e-5,
            min_sampler_weight: 0.0,
            collect_events: true,
        }
    }
}

#[cfg(feature = "json")]
impl Config {
    pub fn from_json_str(input: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(input).map_err(|e| crate::Error::JsonParse {
            message: e.to_string(),
        })
    }
}
