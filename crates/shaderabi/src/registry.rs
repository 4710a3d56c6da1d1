//! The binding slot registry every generated entry point and every host
//! driver agrees on. It is a lookup table, never computed at runtime: each
//! resource kind owns a fixed base index inside one of the two Metal binding
//! namespaces (`buffer(n)` and `texture(n)`).
//!
//! Compatibility boundary: entry points generated against one
//! [`REGISTRY_VERSION`] must only be driven by hosts built against the same
//! version. Adding a [`SlotKind`] or moving a base index is a breaking change
//! and must bump the version; generated sources refuse to compile against
//! a mismatched value.
//!
//! Canonical layout:
//!
//! ```text
//!   buffer space                 texture space
//!   0   environment              0..   input textures   (capacity.textures)
//!   3   persistent state         10..  render inputs    (MAX_RENDER_TARGETS)
//!   15  compute buffer           20..  cubemaps         (capacity.cubes)
//!   20  audio samples            30..  render outputs   (MAX_RENDER_TARGETS)
//!   24  fft samples              40..  text atlases     (capacity.texts)
//!                                50..  video frames     (capacity.videos)
//!                                60    webcam
//! ```
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Bumped whenever a slot kind is added or a base index moves.
pub const REGISTRY_VERSION: u32 = 1;

/// Largest number of auxiliary render targets a fragment stage may write.
pub const MAX_RENDER_TARGETS: u32 = 4;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(
        "{space} slots overlap: {first} occupies {first_range:?} and {second} occupies {second_range:?}"
    )]
    Overlap {
        space: AddressSpace,
        first: SlotKind,
        first_range: Range<u32>,
        second: SlotKind,
        second_range: Range<u32>,
    },
    #[error("{0} capacity must be at least 1")]
    EmptyArray(SlotKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSpace {
    Buffer,
    Texture,
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpace::Buffer => f.write_str("buffer"),
            AddressSpace::Texture => f.write_str("texture"),
        }
    }
}

/// Every resource kind a generated entry point can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Environment,
    PersistentState,
    ComputeBuffer,
    Audio,
    Fft,
    InputTextures,
    RenderInputs,
    Cubes,
    Texts,
    Videos,
    Webcam,
    RenderOutputs,
}

impl SlotKind {
    pub const ALL: [SlotKind; 12] = [
        SlotKind::Environment,
        SlotKind::PersistentState,
        SlotKind::ComputeBuffer,
        SlotKind::Audio,
        SlotKind::Fft,
        SlotKind::InputTextures,
        SlotKind::RenderInputs,
        SlotKind::Cubes,
        SlotKind::Texts,
        SlotKind::Videos,
        SlotKind::Webcam,
        SlotKind::RenderOutputs,
    ];

    pub const fn space(self) -> AddressSpace {
        match self {
            SlotKind::Environment
            | SlotKind::PersistentState
            | SlotKind::ComputeBuffer
            | SlotKind::Audio
            | SlotKind::Fft => AddressSpace::Buffer,
            SlotKind::InputTextures
            | SlotKind::RenderInputs
            | SlotKind::Cubes
            | SlotKind::Texts
            | SlotKind::Videos
            | SlotKind::Webcam
            | SlotKind::RenderOutputs => AddressSpace::Texture,
        }
    }

    pub const fn base_index(self) -> u32 {
        match self {
            SlotKind::Environment => 0,
            SlotKind::PersistentState => 3,
            SlotKind::ComputeBuffer => 15,
            SlotKind::Audio => 20,
            SlotKind::Fft => 24,
            SlotKind::InputTextures => 0,
            SlotKind::RenderInputs => 10,
            SlotKind::Cubes => 20,
            SlotKind::RenderOutputs => 30,
            SlotKind::Texts => 40,
            SlotKind::Videos => 50,
            SlotKind::Webcam => 60,
        }
    }

    /// Name of the constant the generated header declares for this slot.
    pub const fn constant_name(self) -> &'static str {
        match self {
            SlotKind::Environment => "environmentSlot",
            SlotKind::PersistentState => "stateSlot",
            SlotKind::ComputeBuffer => "computeSlot",
            SlotKind::Audio => "audioSlot",
            SlotKind::Fft => "fftSlot",
            SlotKind::InputTextures => "inputTextureSlot",
            SlotKind::RenderInputs => "renderInputSlot",
            SlotKind::Cubes => "cubeSlot",
            SlotKind::Texts => "textSlot",
            SlotKind::Videos => "videoSlot",
            SlotKind::Webcam => "webcamSlot",
            SlotKind::RenderOutputs => "renderOutputSlot",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SlotKind::Environment => "environment",
            SlotKind::PersistentState => "persistent state",
            SlotKind::ComputeBuffer => "compute buffer",
            SlotKind::Audio => "audio",
            SlotKind::Fft => "fft",
            SlotKind::InputTextures => "input textures",
            SlotKind::RenderInputs => "render inputs",
            SlotKind::Cubes => "cubemaps",
            SlotKind::Texts => "text atlases",
            SlotKind::Videos => "videos",
            SlotKind::Webcam => "webcam",
            SlotKind::RenderOutputs => "render outputs",
        };
        f.write_str(label)
    }
}

/// Array lengths for the texture kinds whose size is a build-wide setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayCapacities {
    pub textures: u32,
    pub cubes: u32,
    pub texts: u32,
    pub videos: u32,
}

impl ArrayCapacities {
    pub const DEFAULT: Self = Self {
        textures: 6,
        cubes: 4,
        texts: 4,
        videos: 4,
    };
}

impl Default for ArrayCapacities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One resolved registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub kind: SlotKind,
    pub space: AddressSpace,
    pub index: u32,
    pub len: u32,
}

impl Slot {
    pub fn range(&self) -> Range<u32> {
        self.index..self.index.saturating_add(self.len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRegistry {
    version: u32,
    capacities: ArrayCapacities,
}

/// The registry every build uses unless a config overrides capacities.
pub static CANONICAL: SlotRegistry = SlotRegistry::canonical();

impl SlotRegistry {
    pub const fn canonical() -> Self {
        Self {
            version: REGISTRY_VERSION,
            capacities: ArrayCapacities::DEFAULT,
        }
    }

    /// Builds a registry with custom array capacities, rejecting layouts whose
    /// ranges would collide inside one address space.
    pub fn with_capacities(capacities: ArrayCapacities) -> Result<Self, RegistryError> {
        let registry = Self {
            version: REGISTRY_VERSION,
            capacities,
        };
        registry.validate()?;
        Ok(registry)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn capacities(&self) -> ArrayCapacities {
        self.capacities
    }

    pub fn slot(&self, kind: SlotKind) -> Slot {
        let len = match kind {
            SlotKind::InputTextures => self.capacities.textures,
            SlotKind::Cubes => self.capacities.cubes,
            SlotKind::Texts => self.capacities.texts,
            SlotKind::Videos => self.capacities.videos,
            SlotKind::RenderInputs | SlotKind::RenderOutputs => MAX_RENDER_TARGETS,
            _ => 1,
        };
        Slot {
            kind,
            space: kind.space(),
            index: kind.base_index(),
            len,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        SlotKind::ALL.iter().map(move |kind| self.slot(*kind))
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let slots: Vec<Slot> = self.slots().collect();
        for slot in &slots {
            if slot.len == 0 {
                return Err(RegistryError::EmptyArray(slot.kind));
            }
        }
        for (position, first) in slots.iter().enumerate() {
            for second in &slots[position + 1..] {
                if first.space != second.space {
                    continue;
                }
                let (a, b) = (first.range(), second.range());
                if a.start < b.end && b.start < a.end {
                    return Err(RegistryError::Overlap {
                        space: first.space,
                        first: first.kind,
                        first_range: a,
                        second: second.kind,
                        second_range: b,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_registry_is_collision_free() {
        CANONICAL.validate().expect("canonical layout");
        assert_eq!(CANONICAL.version(), REGISTRY_VERSION);
    }

    #[test]
    fn buffer_and_texture_spaces_share_index_zero() {
        let env = CANONICAL.slot(SlotKind::Environment);
        let textures = CANONICAL.slot(SlotKind::InputTextures);
        assert_eq!(env.index, 0);
        assert_eq!(textures.index, 0);
        assert_ne!(env.space, textures.space);
    }

    #[test]
    fn canonical_indices_are_stable() {
        let pairs: Vec<(SlotKind, u32)> = SlotKind::ALL
            .iter()
            .map(|kind| (*kind, CANONICAL.slot(*kind).index))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (SlotKind::Environment, 0),
                (SlotKind::PersistentState, 3),
                (SlotKind::ComputeBuffer, 15),
                (SlotKind::Audio, 20),
                (SlotKind::Fft, 24),
                (SlotKind::InputTextures, 0),
                (SlotKind::RenderInputs, 10),
                (SlotKind::Cubes, 20),
                (SlotKind::Texts, 40),
                (SlotKind::Videos, 50),
                (SlotKind::Webcam, 60),
                (SlotKind::RenderOutputs, 30),
            ]
        );
    }

    #[test]
    fn rejects_texture_array_spilling_into_render_inputs() {
        let err = SlotRegistry::with_capacities(ArrayCapacities {
            textures: 11,
            ..ArrayCapacities::DEFAULT
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Overlap {
                space: AddressSpace::Texture,
                first: SlotKind::InputTextures,
                second: SlotKind::RenderInputs,
                ..
            }
        ));
    }

    #[test]
    fn accepts_largest_non_overlapping_capacities() {
        let registry = SlotRegistry::with_capacities(ArrayCapacities {
            textures: 10,
            cubes: 10,
            texts: 10,
            videos: 10,
        })
        .expect("fits");
        assert_eq!(registry.slot(SlotKind::Videos).range(), 50..60);
    }

    #[test]
    fn rejects_empty_arrays() {
        let err = SlotRegistry::with_capacities(ArrayCapacities {
            cubes: 0,
            ..ArrayCapacities::DEFAULT
        })
        .unwrap_err();
        assert_eq!(err, RegistryError::EmptyArray(SlotKind::Cubes));
    }
}
