use crate::{Error, Graph, ParameterId, ParameterKind, ParameterValue};
use std::sync::Arc;

/// Per-instance parameter values, laid out in the graph's parameter order.
///
/// Setters clamp to the authored range and never reject a value for being out of range. A
/// non-finite float keeps the previous value.
#[derive(Clone, Debug)]
pub struct ParameterStore {
    graph: Arc<Graph>,
    values: Vec<ParameterValue>,
}

impl ParameterStore {
    pub fn new(graph: Arc<Graph>) -> Self {
        let values = graph.parameters.iter().map(|p| p.default).collect();
        Self { graph, values }
    }

    pub fn reset(&mut self) {
        for (value, def) in self.values.iter_mut().zip(&self.graph.parameters) {
            *value = def.default;
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by index into `GraphData::parameters`.
    #[inline]
    pub fn value(&self, index: usize) -> Option<ParameterValue> {
        self.values.get(index).copied()
    }

    pub fn get(&self, id: ParameterId) -> Option<ParameterValue> {
        self.graph.parameter_slot(id).and_then(|i| self.value(i))
    }

    pub fn get_bool(&self, id: ParameterId) -> Option<bool> {
        match self.get(id)? {
            ParameterValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_int(&self, id: ParameterId) -> Option<i32> {
        match self.get(id)? {
            ParameterValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_float(&self, id: ParameterId) -> Option<f32> {
        match self.get(id)? {
            ParameterValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn set_bool(&mut self, id: ParameterId, value: bool) -> Result<(), Error> {
        let slot = self.slot(id, ParameterKind::Bool)?;
        self.values[slot] = ParameterValue::Bool(value);
        Ok(())
    }

    pub fn set_int(&mut self, id: ParameterId, value: i32) -> Result<(), Error> {
        let slot = self.slot(id, ParameterKind::Int)?;
        let def = &self.graph.parameters[slot];
        let clamped = match def.range {
            Some(range) => {
                let min = range.min.ceil() as i32;
                let max = range.max.floor() as i32;
                if min <= max { value.clamp(min, max) } else { value }
            }
            None => value,
        };
        if clamped != value {
            log::debug!("parameter '{}' clamped from {value} to {clamped}", def.name);
        }
        self.values[slot] = ParameterValue::Int(clamped);
        Ok(())
    }

    pub fn set_float(&mut self, id: ParameterId, value: f32) -> Result<(), Error> {
        let slot = self.slot(id, ParameterKind::Float)?;
        let def = &self.graph.parameters[slot];
        if !value.is_finite() {
            log::debug!("ignoring non-finite value for parameter '{}'", def.name);
            return Ok(());
        }
        let clamped = match def.range {
            Some(range) => value.clamp(range.min, range.max),
            None => value,
        };
        if clamped != value {
            log::debug!("parameter '{}' clamped from {value} to {clamped}", def.name);
        }
        self.values[slot] = ParameterValue::Float(clamped);
        Ok(())
    }

    fn slot(&self, id: ParameterId, expected: ParameterKind) -> Result<usize, Error> {
        let Some(slot) = self.graph.parameter_slot(id) else {
            return Err(Error::UnknownParameter {
                parameter: id.to_string(),
            });
        };
        let def = &self.graph.parameters[slot];
        if def.kind() != expected {
            return Err(Error::ParameterKindMismatch {
                name: def.name.clone(),
                expected,
                actual: def.kind(),
            });
        }
        Ok(slot)
    }
}
