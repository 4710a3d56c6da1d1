//! Entry-point generation for stagegen shader units.
//!
//! Each unit directory declares its stages in `stage.toml`; this crate turns
//! them into Metal entry points that all agree on one binding layout, so a
//! single host driver can feed any shader without per-shader glue:
//!
//! ```text
//!   stage.toml ──▶ ShaderUnit::load ──▶ Generator::entry ──▶ verify_uniform
//!                                             │                    │
//!                        render_header ◀── SlotRegistry            ▼
//!                              │                         GeneratedUnit (.metal)
//!                              ▼                                   │
//!                      stagegen_common.h                 DispatchTable (json)
//! ```
//!
//! Names are `{identity}___{pass}___{Suffix}`; signatures come only from the
//! stage tag and the registry, never from the identity.
mod config;
mod dispatch;
mod entry;
mod error;
mod identity;
mod initialize;
mod manifest;
mod prelude;
mod signature;
mod stage;
mod unit;

pub use config::{ConfigError, GeneratorConfig, HostPass, DEFAULT_DISPATCH};
pub use dispatch::{DispatchEntry, DispatchTable, UnitDispatch};
pub use entry::{entry_name, EntryPoint, Generator};
pub use error::GenerateError;
pub use identity::{PassLabel, ShaderIdentity};
pub use initialize::hook_name;
pub use manifest::{StageDecl, StageKind, UnitManifest, VertexOutput};
pub use prelude::{render_header, DEFAULT_HEADER};
pub use signature::{canonical, verify_uniform, Binding, Parameter, Signature};
pub use stage::{OutputField, OutputShape, RenderTargets, Stage};
pub use unit::{GeneratedUnit, LoadOptions, ShaderUnit, UnitError, MANIFEST_FILE};
