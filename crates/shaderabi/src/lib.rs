//! Host-facing half of the shader binding ABI.
//!
//! Every entry point `entrygen` emits binds its resources at the slots this
//! crate's [`registry`] fixes, reads an [`Environment`] record at the
//! environment slot, and shares one persistent-state record per shader. A host
//! driver links this crate to fill those slots with matching bytes:
//!
//! ```text
//!   host driver ──▶ Environment (bytes_of) ──▶ buffer(environmentSlot)
//!        │
//!        └──▶ PersistentState<K> ── initialize once ──▶ buffer(stateSlot)
//!                                    invoke per frame
//! ```
mod environment;
mod names;
pub mod registry;
mod state;

pub use environment::{Environment, FrameClock, MslField};
pub use names::{NameError, NameRecord, NameTable, NameTableKind, NAME_CAPACITY};
pub use registry::{
    AddressSpace, ArrayCapacities, RegistryError, Slot, SlotKind, SlotRegistry, CANONICAL,
    MAX_RENDER_TARGETS, REGISTRY_VERSION,
};
pub use state::{PersistentState, StateError};
