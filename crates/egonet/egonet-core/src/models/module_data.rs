use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::payload::Payload;
use crate::errors::{EgoNetError, EgoNetResult};

/// Per-module data attached to a node, edge or context.
///
/// Each module owns one slot, keyed by its name, and stores whatever it
/// needs as a JSON payload. Slots are persisted with their owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleData {
    slots: BTreeMap<String, Payload>,
}

impl ModuleData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &str) -> Option<&Payload> {
        self.slots.get(module)
    }

    /// Return the slot of `module`, filling it with `init()` first if empty.
    pub fn get_or_insert_with(
        &mut self,
        module: &str,
        init: impl FnOnce() -> Payload,
    ) -> EgoNetResult<&mut Payload> {
        check_module_name(module)?;
        Ok(self.slots.entry(module.to_string()).or_insert_with(init))
    }

    /// Replace the slot of `module`. Returns the previous value.
    pub fn set(&mut self, module: &str, value: Payload) -> EgoNetResult<Option<Payload>> {
        check_module_name(module)?;
        Ok(self.slots.insert(module.to_string(), value))
    }

    pub fn remove(&mut self, module: &str) -> Option<Payload> {
        self.slots.remove(module)
    }

    /// Typed view of the slot of `module`, created from `T::default()` if
    /// empty. Returns the value and whether the slot was created.
    pub fn get_or_create_instance<T>(&mut self, module: &str) -> EgoNetResult<(T, bool)>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        check_module_name(module)?;
        if let Some(existing) = self.slots.get(module) {
            return Ok((serde_json::from_value(existing.clone())?, false));
        }
        let instance = T::default();
        self.slots
            .insert(module.to_string(), serde_json::to_value(&instance)?);
        Ok((instance, true))
    }

    /// Store `value` as the slot of `module`.
    pub fn set_instance<T: Serialize>(&mut self, module: &str, value: &T) -> EgoNetResult<()> {
        let payload = serde_json::to_value(value)?;
        self.set(module, payload)?;
        Ok(())
    }

    /// Module names with a slot, sorted.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn check_module_name(module: &str) -> EgoNetResult<()> {
    if module.trim().is_empty() {
        return Err(EgoNetError::invalid("module name cannot be empty"));
    }
    Ok(())
}
