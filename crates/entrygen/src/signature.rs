//! Canonical parameter lists per stage and the uniformity check that guards
//! them.
//!
//! The host driver binds resources by slot without knowing which shader it is
//! feeding, so every entry point of one stage tag must present the same
//! parameters, in the same order, at the same slots. [`canonical`] is the one
//! place that list is written down; [`verify_uniform`] compares generated
//! entry points against it.
use std::collections::HashSet;

use serde::Serialize;
use shaderabi::{AddressSpace, Slot, SlotKind, SlotRegistry};

use crate::entry::EntryPoint;
use crate::error::GenerateError;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "binding")]
pub enum Binding {
    Slot(Slot),
    ThreadPosition,
    VertexId,
    InstanceId,
    StageIn,
    PointCoord,
}

impl Binding {
    pub fn attribute(&self) -> String {
        match self {
            Binding::Slot(slot) => {
                let space = match slot.space {
                    AddressSpace::Buffer => "buffer",
                    AddressSpace::Texture => "texture",
                };
                format!("[[{space}({})]]", slot.kind.constant_name())
            }
            Binding::ThreadPosition => "[[thread_position_in_grid]]".to_string(),
            Binding::VertexId => "[[vertex_id]]".to_string(),
            Binding::InstanceId => "[[instance_id]]".to_string(),
            Binding::StageIn => "[[stage_in]]".to_string(),
            Binding::PointCoord => "[[point_coord]]".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: &'static str,
    pub ty: String,
    pub binding: Binding,
}

impl Parameter {
    fn new(name: &'static str, ty: impl Into<String>, binding: Binding) -> Self {
        Self {
            name,
            ty: ty.into(),
            binding,
        }
    }

    pub fn render(&self) -> String {
        format!("{} {} {}", self.ty, self.name, self.binding.attribute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub stage: Stage,
    pub returns: String,
    pub params: Vec<Parameter>,
}

impl Signature {
    pub fn slots(&self) -> Vec<Slot> {
        self.params
            .iter()
            .filter_map(|param| match param.binding {
                Binding::Slot(slot) => Some(slot),
                _ => None,
            })
            .collect()
    }

    pub fn render_declaration(&self, name: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|param| format!("  {}", param.render()))
            .collect();
        format!(
            "{} {} {}(\n{}\n)",
            self.stage.qualifier(),
            self.returns,
            name,
            params.join(",\n")
        )
    }

    /// Describes the first difference from `other`, or `None` when identical.
    pub fn diff(&self, other: &Signature) -> Option<String> {
        if self.stage != other.stage {
            return Some(format!("stage {} vs {}", self.stage, other.stage));
        }
        if self.returns != other.returns {
            return Some(format!(
                "returns '{}' instead of '{}'",
                other.returns, self.returns
            ));
        }
        for (position, (expected, found)) in self.params.iter().zip(&other.params).enumerate() {
            if expected != found {
                return Some(format!(
                    "parameter {position} is '{}' instead of '{}'",
                    found.render(),
                    expected.render()
                ));
            }
        }
        if self.params.len() != other.params.len() {
            return Some(format!(
                "{} parameters instead of {}",
                other.params.len(),
                self.params.len()
            ));
        }
        None
    }
}

/// The parameter list every entry point of `stage` must carry.
pub fn canonical(stage: Stage, registry: &SlotRegistry) -> Signature {
    let slot = |kind| Binding::Slot(registry.slot(kind));
    let environment = || Parameter::new("uni", "constant Uniform &", slot(SlotKind::Environment));
    let state = |ty: &str| Parameter::new("kbuff", ty, slot(SlotKind::PersistentState));
    let compute = |ty: &str| Parameter::new("computeBuffer", ty, slot(SlotKind::ComputeBuffer));
    let textures = || {
        Parameter::new(
            "texture",
            "array<texture2d<float>, TEXTURE_CAPACITY>",
            slot(SlotKind::InputTextures),
        )
    };
    let stage_in = || Parameter::new("thisVertex", "VertexOut", Binding::StageIn);

    let (returns, params) = match stage {
        Stage::Compute => (
            "void".to_string(),
            vec![
                Parameter::new("xCoord", "uint3", Binding::ThreadPosition),
                environment(),
                state("device KBuffer &"),
                compute("device ComputeBuffer &"),
            ],
        ),
        Stage::Vertex => (
            "VertexOut".to_string(),
            vec![
                Parameter::new("vid", "uint", Binding::VertexId),
                Parameter::new("iid", "uint", Binding::InstanceId),
                environment(),
                state("constant KBuffer &"),
                compute("device const ComputeBuffer &"),
            ],
        ),
        Stage::Fragment(targets) => (
            crate::stage::OutputShape::new(targets).type_name(),
            vec![
                stage_in(),
                Parameter::new("pointCoord", "float2", Binding::PointCoord),
                environment(),
                state("device KBuffer &"),
                textures(),
                Parameter::new(
                    "renderInput",
                    format!(
                        "array<texture2d<float, access::sample>, {}>",
                        targets.count()
                    ),
                    Binding::Slot(Slot {
                        len: u32::from(targets.count()),
                        ..registry.slot(SlotKind::RenderInputs)
                    }),
                ),
                Parameter::new(
                    "cube",
                    "array<texturecube<float>, CUBE_CAPACITY>",
                    slot(SlotKind::Cubes),
                ),
                Parameter::new(
                    "text",
                    "array<texture2d<float>, TEXT_CAPACITY>",
                    slot(SlotKind::Texts),
                ),
                Parameter::new("audio", "device float *", slot(SlotKind::Audio)),
                Parameter::new("fft", "device float *", slot(SlotKind::Fft)),
                Parameter::new(
                    "video",
                    "array<texture2d<float>, VIDEO_CAPACITY>",
                    slot(SlotKind::Videos),
                ),
                Parameter::new("webcam", "texture2d<float>", slot(SlotKind::Webcam)),
                compute("device const ComputeBuffer &"),
            ],
        ),
        Stage::Filter(targets) => (
            crate::stage::OutputShape::new(targets).type_name(),
            vec![
                stage_in(),
                textures(),
                compute("device const ComputeBuffer &"),
            ],
        ),
        Stage::Initialize => (
            "void".to_string(),
            vec![environment(), state("device KBuffer &")],
        ),
    };

    Signature {
        stage,
        returns,
        params,
    }
}

/// Checks that every entry carries its stage's canonical signature and that
/// no entry name is produced twice.
pub fn verify_uniform<'a>(
    entries: impl IntoIterator<Item = &'a EntryPoint>,
    registry: &SlotRegistry,
) -> Result<(), GenerateError> {
    let mut names = HashSet::new();
    for entry in entries {
        if !names.insert(entry.name.as_str()) {
            return Err(GenerateError::DuplicateEntry(entry.name.clone()));
        }
        let expected = canonical(entry.stage, registry);
        if let Some(detail) = expected.diff(&entry.signature) {
            return Err(GenerateError::LayoutMismatch {
                entry: entry.name.clone(),
                stage: entry.stage.to_string(),
                detail,
            });
        }
    }
    Ok(())
}
