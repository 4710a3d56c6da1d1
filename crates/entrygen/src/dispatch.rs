//! Host-facing index of everything a build generated.
//!
//! The table is what a driver loads at startup: for each shader, the name of
//! its initializer and of every entry point with the slots it binds. It is
//! written next to the generated sources as JSON.
use serde::{Deserialize, Serialize};
use shaderabi::{ArrayCapacities, Slot, SlotRegistry};

use crate::config::HostPass;
use crate::error::GenerateError;
use crate::stage::{OutputShape, RenderTargets, Stage};
use crate::unit::GeneratedUnit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTable {
    pub registry_version: u32,
    pub capacities: ArrayCapacities,
    #[serde(default)]
    pub units: Vec<UnitDispatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDispatch {
    pub identity: String,
    pub source: String,
    pub initializer: String,
    #[serde(default)]
    pub entries: Vec<DispatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEntry {
    pub name: String,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_targets: Option<u8>,
    pub slots: Vec<Slot>,
}

impl DispatchTable {
    pub fn new(registry: &SlotRegistry) -> Self {
        Self {
            registry_version: registry.version(),
            capacities: registry.capacities(),
            units: Vec::new(),
        }
    }

    /// Adds a generated unit, refusing identities or entry names already present.
    pub fn push_unit(&mut self, unit: &GeneratedUnit) -> Result<(), GenerateError> {
        let initializer = unit
            .initializer()
            .ok_or_else(|| GenerateError::MissingInitializer(unit.identity.to_string()))?;
        if self.unit(unit.identity.as_str()).is_some() {
            return Err(GenerateError::DuplicateEntry(initializer.name.clone()));
        }

        let mut entries = Vec::with_capacity(unit.entries.len());
        for entry in &unit.entries {
            if self.contains_name(&entry.name) {
                return Err(GenerateError::DuplicateEntry(entry.name.clone()));
            }
            if entry.stage == Stage::Initialize {
                continue;
            }
            entries.push(DispatchEntry {
                name: entry.name.clone(),
                stage: entry.stage.tag().to_string(),
                pass: entry.pass.as_ref().map(|pass| pass.to_string()),
                render_targets: entry.stage.render_targets().map(RenderTargets::count),
                slots: entry.signature.slots(),
            });
        }

        self.units.push(UnitDispatch {
            identity: unit.identity.to_string(),
            source: unit.file_name(),
            initializer: initializer.name.clone(),
            entries,
        });
        Ok(())
    }

    fn contains_name(&self, name: &str) -> bool {
        self.units.iter().any(|unit| {
            unit.initializer == name || unit.entries.iter().any(|entry| entry.name == name)
        })
    }

    pub fn unit(&self, identity: &str) -> Option<&UnitDispatch> {
        self.units.iter().find(|unit| unit.identity == identity)
    }

    pub fn initializer(&self, identity: &str) -> Option<&str> {
        self.unit(identity).map(|unit| unit.initializer.as_str())
    }

    pub fn lookup(&self, identity: &str, pass: Option<&str>, stage: &str) -> Option<&DispatchEntry> {
        self.unit(identity)?
            .entries
            .iter()
            .find(|entry| entry.stage == stage && entry.pass.as_deref() == pass)
    }

    /// Confirms each host pass has a fragment entry writing the same number
    /// of render targets the host allocates.
    pub fn check_host_passes(&self, passes: &[HostPass]) -> Result<(), GenerateError> {
        for host in passes {
            let unknown = || GenerateError::UnknownPass {
                shader: host.shader.clone(),
                pass: host.pass.clone(),
            };
            let candidates: Vec<&DispatchEntry> = self
                .unit(&host.shader)
                .ok_or_else(unknown)?
                .entries
                .iter()
                .filter(|entry| entry.stage == "fragment" && entry.pass == host.pass)
                .collect();
            let first = candidates.first().ok_or_else(unknown)?;
            if candidates
                .iter()
                .any(|entry| entry.render_targets == Some(host.render_targets))
            {
                continue;
            }
            let generated = RenderTargets::try_from(first.render_targets.unwrap_or(0))?;
            OutputShape::new(generated).check_host(&first.name, host.render_targets)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}
