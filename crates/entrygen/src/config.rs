use serde::{Deserialize, Serialize};
use shaderabi::{ArrayCapacities, SlotRegistry};

use crate::identity::{PassLabel, ShaderIdentity};
use crate::prelude::DEFAULT_HEADER;
use crate::stage::RenderTargets;

pub const DEFAULT_DISPATCH: &str = "dispatch.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `stagegen.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GeneratorConfig {
    pub version: u32,
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default = "default_dispatch")]
    pub dispatch: String,
    #[serde(default)]
    pub capacities: ArrayCapacities,
    #[serde(default)]
    pub passes: Vec<HostPass>,
}

/// A render pass the host will run, with the target count it allocates.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HostPass {
    pub shader: String,
    #[serde(default)]
    pub pass: Option<String>,
    pub render_targets: u8,
}

fn default_header() -> String {
    DEFAULT_HEADER.to_string()
}

fn default_dispatch() -> String {
    DEFAULT_DISPATCH.to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            header: default_header(),
            dispatch: default_dispatch(),
            capacities: ArrayCapacities::DEFAULT,
            passes: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GeneratorConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }
        check_file_name("header", &self.header, ".h")?;
        check_file_name("dispatch", &self.dispatch, ".json")?;
        self.registry()?;

        for pass in &self.passes {
            ShaderIdentity::new(pass.shader.as_str())
                .map_err(|err| ConfigError::Invalid(format!("passes: {err}")))?;
            if let Some(label) = &pass.pass {
                PassLabel::new(label.as_str())
                    .map_err(|err| ConfigError::Invalid(format!("passes: {err}")))?;
            }
            RenderTargets::try_from(pass.render_targets).map_err(|err| {
                ConfigError::Invalid(format!("pass for shader '{}': {err}", pass.shader))
            })?;
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<SlotRegistry, ConfigError> {
        SlotRegistry::with_capacities(self.capacities)
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

fn check_file_name(field: &str, value: &str, extension: &str) -> Result<(), ConfigError> {
    if value.len() <= extension.len() || !value.ends_with(extension) {
        return Err(ConfigError::Invalid(format!(
            "{field} '{value}' must be a file name ending in {extension}"
        )));
    }
    if value.contains(['/', '\\']) {
        return Err(ConfigError::Invalid(format!(
            "{field} '{value}' must not contain path separators"
        )));
    }
    Ok(())
}
