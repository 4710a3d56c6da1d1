//! Fixed-capacity label records stored inside persistent state.
//!
//! Shaders name the textures, videos, cubemaps and music they want by writing
//! labels into `string` records during initialization; the host reads them
//! back afterwards to decide what to bind. A record holds [`NAME_CAPACITY`]
//! bytes and carries no length: copies write exactly the source bytes and
//! readers stop at the first NUL.
//!
//! Overflow policy is rejection. A source longer than the record is refused
//! with [`NameError::Capacity`] and the destination is left untouched; nothing
//! is truncated. The generated shader helper enforces the same rule at shader
//! build time with a `static_assert`.
use std::fmt;

use bytemuck::{Pod, Zeroable};

pub const NAME_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("label of {len} bytes exceeds name capacity of {} bytes", NAME_CAPACITY)]
    Capacity { len: usize },
    #[error("{table} index {index} out of range (table holds {len} records)")]
    Index {
        table: NameTableKind,
        index: usize,
        len: usize,
    },
    #[error("label is not valid UTF-8")]
    Encoding,
}

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NameRecord {
    bytes: [u8; NAME_CAPACITY],
}

unsafe impl Zeroable for NameRecord {}
unsafe impl Pod for NameRecord {}

impl NameRecord {
    pub fn empty() -> Self {
        Self::zeroed()
    }

    /// Copies `source` byte-for-byte into the front of the record.
    ///
    /// Bytes past `source.len()` keep whatever they held before.
    pub fn copy_from(&mut self, source: &[u8]) -> Result<usize, NameError> {
        if source.len() > NAME_CAPACITY {
            return Err(NameError::Capacity { len: source.len() });
        }
        self.bytes[..source.len()].copy_from_slice(source);
        Ok(source.len())
    }

    /// Writes `label` followed by a NUL, the same bytes a shader literal copies.
    pub fn set(&mut self, label: &str) -> Result<(), NameError> {
        let len = label.len() + 1;
        if len > NAME_CAPACITY {
            return Err(NameError::Capacity { len });
        }
        self.bytes[..label.len()].copy_from_slice(label.as_bytes());
        self.bytes[label.len()] = 0;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8; NAME_CAPACITY] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// Reads the label up to the first NUL, or the whole record when none is present.
    pub fn label(&self) -> Result<&str, NameError> {
        let end = self
            .bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(NAME_CAPACITY);
        std::str::from_utf8(&self.bytes[..end]).map_err(|_| NameError::Encoding)
    }
}

impl Default for NameRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for NameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Ok(label) => f.debug_tuple("NameRecord").field(&label).finish(),
            Err(_) => f.debug_tuple("NameRecord").field(&"<binary>").finish(),
        }
    }
}

/// The label tables a shader's persistent state may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameTableKind {
    Textures,
    Music,
    Videos,
    Cubes,
}

impl NameTableKind {
    pub const ALL: [NameTableKind; 4] = [
        NameTableKind::Textures,
        NameTableKind::Music,
        NameTableKind::Videos,
        NameTableKind::Cubes,
    ];

    /// Field the shader's state struct uses for this table.
    pub const fn field(self) -> &'static str {
        match self {
            NameTableKind::Textures => "textures",
            NameTableKind::Music => "music",
            NameTableKind::Videos => "videos",
            NameTableKind::Cubes => "cubes",
        }
    }

    /// Setter macro the generated header exposes for this table.
    pub const fn setter(self) -> &'static str {
        match self {
            NameTableKind::Textures => "setTex",
            NameTableKind::Music => "setMusic",
            NameTableKind::Videos => "setVideo",
            NameTableKind::Cubes => "setCube",
        }
    }
}

impl fmt::Display for NameTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct NameTable<const N: usize> {
    records: [NameRecord; N],
}

unsafe impl<const N: usize> Zeroable for NameTable<N> {}
unsafe impl<const N: usize> Pod for NameTable<N> {}

impl<const N: usize> NameTable<N> {
    pub fn new() -> Self {
        Self::zeroed()
    }

    pub fn set(&mut self, kind: NameTableKind, index: usize, label: &str) -> Result<(), NameError> {
        let record = self.records.get_mut(index).ok_or(NameError::Index {
            table: kind,
            index,
            len: N,
        })?;
        record.set(label)
    }

    pub fn get(&self, index: usize) -> Option<&NameRecord> {
        self.records.get(index)
    }

    /// Non-empty labels in slot order, paired with their index.
    pub fn names(&self) -> Result<Vec<(usize, String)>, NameError> {
        let mut names = Vec::new();
        for (index, record) in self.records.iter().enumerate() {
            if record.is_empty() {
                continue;
            }
            names.push((index, record.label()?.to_string()));
        }
        Ok(names)
    }
}

impl<const N: usize> Default for NameTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
