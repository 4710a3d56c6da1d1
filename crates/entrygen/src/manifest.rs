//! Schema of the `stage.toml` file describing one shader unit.
//!
//! A unit names its identity, picks the compute element type and vertex
//! output flavour, optionally points at a prelude source holding its `KBuffer`
//! definition and helpers, and lists the stages to generate. Each stage body
//! comes either inline (`body`) or from a file next to the manifest
//! (`source`).
//!
//! `UnitManifest::validate` returns human-readable issues instead of failing
//! on the first one so authors see every problem in one pass.
use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::identity::{PassLabel, ShaderIdentity};
use crate::stage::{RenderTargets, Stage};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UnitManifest {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_compute_element")]
    pub compute_element: String,
    #[serde(default)]
    pub vertex_output: VertexOutput,
    #[serde(default)]
    pub prelude: Option<PathBuf>,
    #[serde(default)]
    pub stages: Vec<StageDecl>,
}

fn default_compute_element() -> String {
    "float4".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VertexOutput {
    #[default]
    Triangle,
    Point,
}

impl VertexOutput {
    pub fn type_name(self) -> &'static str {
        match self {
            VertexOutput::Triangle => "VertexOutTriangle",
            VertexOutput::Point => "VertexOutPoint",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Compute,
    Vertex,
    Fragment,
    Filter,
    Initialize,
}

impl StageKind {
    pub fn tag(self) -> &'static str {
        match self {
            StageKind::Compute => "compute",
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
            StageKind::Filter => "filter",
            StageKind::Initialize => "initialize",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StageDecl {
    pub kind: StageKind,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub targets: u8,
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub body: Option<String>,
}

impl StageDecl {
    pub fn stage(&self) -> Result<Stage, GenerateError> {
        Ok(match self.kind {
            StageKind::Compute => Stage::Compute,
            StageKind::Vertex => Stage::Vertex,
            StageKind::Fragment => Stage::Fragment(RenderTargets::try_from(self.targets)?),
            StageKind::Filter => Stage::Filter(RenderTargets::try_from(self.targets)?),
            StageKind::Initialize => Stage::Initialize,
        })
    }

    fn describe(&self) -> String {
        let kind = self.kind.tag();
        match &self.pass {
            Some(pass) => format!("{kind} stage '{pass}'"),
            None => format!("{kind} stage"),
        }
    }
}

impl UnitManifest {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.stages.is_empty() {
            issues.push("manifest must declare at least one stage".to_string());
        }
        if let Some(identity) = &self.identity {
            if let Err(err) = ShaderIdentity::new(identity.as_str()) {
                issues.push(err.to_string());
            }
        }
        if self.compute_element.is_empty()
            || !self
                .compute_element
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            issues.push(format!(
                "compute_element '{}' must be a plain type name",
                self.compute_element
            ));
        }

        let mut seen = HashSet::new();
        let mut initializers = 0;
        for decl in &self.stages {
            let what = decl.describe();
            if let Some(pass) = &decl.pass {
                if let Err(err) = PassLabel::new(pass.as_str()) {
                    issues.push(format!("{what}: {err}"));
                }
            }
            match decl.kind {
                StageKind::Fragment | StageKind::Filter => {
                    if let Err(err) = RenderTargets::try_from(decl.targets) {
                        issues.push(format!("{what}: {err}"));
                    }
                }
                _ if decl.targets != 0 => {
                    issues.push(format!("{what} does not take render targets"));
                }
                _ => {}
            }
            if decl.kind == StageKind::Initialize {
                initializers += 1;
                if decl.pass.is_some() {
                    issues.push(format!("{what}: initializers cannot carry a pass label"));
                }
            }
            match (&decl.source, &decl.body) {
                (Some(_), Some(_)) => {
                    issues.push(format!("{what} sets both `source` and `body`"));
                }
                (None, None) => issues.push(format!("{what} needs a `source` or a `body`")),
                _ => {}
            }
            if !seen.insert((decl.kind, decl.pass.clone(), decl.targets)) {
                issues.push(format!("{what} is declared more than once"));
            }
        }
        if initializers > 1 {
            issues.push("manifest declares more than one initialize stage".to_string());
        }
        issues
    }
}
