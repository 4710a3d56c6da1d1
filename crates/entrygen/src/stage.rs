use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// Number of auxiliary color outputs a fragment or filter stage writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RenderTargets {
    Zero,
    One,
    Two,
    Three,
    Four,
}

impl RenderTargets {
    pub const ALL: [RenderTargets; 5] = [
        RenderTargets::Zero,
        RenderTargets::One,
        RenderTargets::Two,
        RenderTargets::Three,
        RenderTargets::Four,
    ];

    pub const fn count(self) -> u8 {
        match self {
            RenderTargets::Zero => 0,
            RenderTargets::One => 1,
            RenderTargets::Two => 2,
            RenderTargets::Three => 3,
            RenderTargets::Four => 4,
        }
    }
}

impl TryFrom<u8> for RenderTargets {
    type Error = GenerateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(GenerateError::RenderTargetCount(value))
    }
}

impl From<RenderTargets> for u8 {
    fn from(value: RenderTargets) -> Self {
        value.count()
    }
}

/// Stage tag of a generated entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Compute,
    Vertex,
    Fragment(RenderTargets),
    Filter(RenderTargets),
    Initialize,
}

impl Stage {
    pub fn tag(&self) -> &'static str {
        match self {
            Stage::Compute => "compute",
            Stage::Vertex => "vertex",
            Stage::Fragment(_) => "fragment",
            Stage::Filter(_) => "filter",
            Stage::Initialize => "initialize",
        }
    }

    /// Function qualifier in the generated source.
    pub fn qualifier(&self) -> &'static str {
        match self {
            Stage::Compute | Stage::Initialize => "kernel",
            Stage::Vertex => "vertex",
            Stage::Fragment(_) | Stage::Filter(_) => "fragment",
        }
    }

    /// Trailing segment of the entry name.
    pub fn suffix(&self) -> String {
        match self {
            Stage::Compute => "Kernel".to_string(),
            Stage::Vertex => "Vertex".to_string(),
            Stage::Fragment(targets) => format!("Fragment{}", targets.count()),
            Stage::Filter(targets) => format!("Filter{}", targets.count()),
            Stage::Initialize => "InitializeOptions".to_string(),
        }
    }

    pub fn render_targets(&self) -> Option<RenderTargets> {
        match self {
            Stage::Fragment(targets) | Stage::Filter(targets) => Some(*targets),
            _ => None,
        }
    }

    pub fn output(&self) -> Option<OutputShape> {
        self.render_targets().map(OutputShape::new)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render_targets() {
            Some(targets) => write!(f, "{}[{}]", self.tag(), targets.count()),
            None => f.write_str(self.tag()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputField {
    pub name: String,
    pub color: u8,
}

/// Output record selected for a fragment-like stage.
///
/// Zero targets return a bare `float4`; otherwise a struct carrying the
/// primary color at `color(0)` followed by `pass1..passN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputShape {
    targets: RenderTargets,
}

impl OutputShape {
    pub const fn new(targets: RenderTargets) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> RenderTargets {
        self.targets
    }

    pub fn type_name(&self) -> String {
        format!("FragmentOutput{}", self.targets.count())
    }

    pub fn fields(&self) -> Vec<OutputField> {
        let mut fields = Vec::with_capacity(usize::from(self.targets.count()) + 1);
        fields.push(OutputField {
            name: "fragColor".to_string(),
            color: 0,
        });
        for index in 1..=self.targets.count() {
            fields.push(OutputField {
                name: format!("pass{index}"),
                color: index,
            });
        }
        fields
    }

    /// Fails when the host configured a different target count for the pass.
    pub fn check_host(&self, entry: &str, configured: u8) -> Result<(), GenerateError> {
        if configured != self.targets.count() {
            return Err(GenerateError::RenderTargetMismatch {
                entry: entry.to_string(),
                generated: self.targets.count(),
                configured,
            });
        }
        Ok(())
    }

    pub fn render_msl(&self) -> String {
        if self.targets == RenderTargets::Zero {
            return format!("typedef float4 {};\n", self.type_name());
        }
        let mut out = format!("struct {} {{\n", self.type_name());
        for field in self.fields() {
            out.push_str(&format!(
                "  float4 {} [[color({})]];\n",
                field.name, field.color
            ));
        }
        out.push_str("};\n");
        out
    }
}
