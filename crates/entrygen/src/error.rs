use shaderabi::RegistryError;
use thiserror::Error;

/// Build-time failures. None of these are recoverable: the generated layout
/// is either correct for every shader or nothing is emitted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("shader unit '{unit}' has no identity; set `identity` in its manifest")]
    MissingIdentity { unit: String },

    #[error("invalid {kind} '{value}': {reason}")]
    InvalidToken {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("render target count {0} is outside 0..=4")]
    RenderTargetCount(u8),

    #[error(
        "entry '{entry}' writes {generated} render targets but the host pass is configured for {configured}"
    )]
    RenderTargetMismatch {
        entry: String,
        generated: u8,
        configured: u8,
    },

    #[error("entry '{entry}' ({stage}) diverges from the canonical binding layout: {detail}")]
    LayoutMismatch {
        entry: String,
        stage: String,
        detail: String,
    },

    #[error("shader '{0}' exports no initializer entry point")]
    MissingInitializer(String),

    #[error("entry point '{0}' is generated more than once")]
    DuplicateEntry(String),

    #[error("host pass references unknown fragment entry for shader '{shader}' pass {pass:?}")]
    UnknownPass {
        shader: String,
        pass: Option<String>,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
