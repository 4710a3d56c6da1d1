use shaderabi::SlotRegistry;

use crate::identity::{PassLabel, ShaderIdentity};
use crate::initialize;
use crate::signature::{self, Signature};
use crate::stage::Stage;

/// Builds the exported name for an (identity, pass, stage) tuple.
///
/// The initializer never carries a pass segment: there is one per shader.
pub fn entry_name(identity: &ShaderIdentity, pass: Option<&PassLabel>, stage: Stage) -> String {
    match (stage, pass) {
        (Stage::Initialize, _) | (_, None) => format!("{identity}___{}", stage.suffix()),
        (_, Some(pass)) => format!("{identity}___{pass}___{}", stage.suffix()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub identity: ShaderIdentity,
    pub pass: Option<PassLabel>,
    pub stage: Stage,
    pub signature: Signature,
    pub body: String,
}

impl EntryPoint {
    pub fn render(&self) -> String {
        if self.stage == Stage::Initialize {
            return initialize::render(self);
        }
        format!(
            "{} {{\n{}\n}}\n",
            self.signature.render_declaration(&self.name),
            indent_body(&self.body)
        )
    }
}

/// Produces entry points bound to one registry.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'r> {
    registry: &'r SlotRegistry,
}

impl<'r> Generator<'r> {
    pub fn new(registry: &'r SlotRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SlotRegistry {
        self.registry
    }

    pub fn entry(
        &self,
        identity: &ShaderIdentity,
        pass: Option<&PassLabel>,
        stage: Stage,
        body: &str,
    ) -> EntryPoint {
        let pass = match stage {
            Stage::Initialize => None,
            _ => pass.cloned(),
        };
        let name = entry_name(identity, pass.as_ref(), stage);
        tracing::debug!(entry = %name, stage = %stage, "generated entry point");
        EntryPoint {
            name,
            identity: identity.clone(),
            pass,
            stage,
            signature: signature::canonical(stage, self.registry),
            body: body.to_string(),
        }
    }

    pub fn initializer(&self, identity: &ShaderIdentity, body: &str) -> EntryPoint {
        self.entry(identity, None, Stage::Initialize, body)
    }
}

pub(crate) fn indent_body(body: &str) -> String {
    body.trim_end()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("  {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
