//! Tokens that become part of generated entry-point names.
//!
//! Names are built as `identity___pass___Suffix`. Both tokens must be C
//! identifiers without `__` and without a trailing `_`, so the `___`
//! separator can only appear where the generator put it and two different
//! (identity, pass, stage) tuples can never produce the same name.
//!
//! An absent pass drops its segment instead of leaving it empty, so an
//! unlabelled kernel is `plasma___Kernel` and never `plasma______Kernel`. The
//! initializer also takes the separator: `plasma___InitializeOptions`, not
//! `plasmaInitializeOptions`. Hosts that compose names by concatenation will
//! not find these entry points; they resolve names through the dispatch table.
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShaderIdentity(String);

impl ShaderIdentity {
    pub fn new(raw: impl Into<String>) -> Result<Self, GenerateError> {
        let raw = raw.into();
        validate_token("shader identity", &raw)?;
        Ok(Self(raw))
    }

    /// Resolves the identity a unit declares, failing loudly when it is absent.
    pub fn require(declared: Option<&str>, unit: &str) -> Result<Self, GenerateError> {
        match declared.map(str::trim) {
            Some(raw) if !raw.is_empty() => Self::new(raw),
            _ => Err(GenerateError::MissingIdentity {
                unit: unit.to_string(),
            }),
        }
    }

    /// Derives an identity from a file or directory name.
    ///
    /// Separators such as `-`, `.` and spaces become `_`, repeated underscores
    /// collapse, and the result must still be a valid identity.
    pub fn from_path(path: &Path) -> Result<Self, GenerateError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| GenerateError::MissingIdentity {
                unit: path.display().to_string(),
            })?;

        let mut sanitized = String::with_capacity(stem.len());
        for ch in stem.chars() {
            let mapped = if ch.is_ascii_alphanumeric() { ch } else { '_' };
            if mapped == '_' && (sanitized.is_empty() || sanitized.ends_with('_')) {
                continue;
            }
            sanitized.push(mapped);
        }
        while sanitized.ends_with('_') {
            sanitized.pop();
        }
        Self::new(sanitized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShaderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShaderIdentity {
    type Error = GenerateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShaderIdentity> for String {
    fn from(value: ShaderIdentity) -> Self {
        value.0
    }
}

/// Optional per-stage label distinguishing several passes of one shader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PassLabel(String);

impl PassLabel {
    pub fn new(raw: impl Into<String>) -> Result<Self, GenerateError> {
        let raw = raw.into();
        validate_token("pass label", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PassLabel {
    type Error = GenerateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PassLabel> for String {
    fn from(value: PassLabel) -> Self {
        value.0
    }
}

fn validate_token(kind: &'static str, raw: &str) -> Result<(), GenerateError> {
    let invalid = |reason| GenerateError::InvalidToken {
        kind,
        value: raw.to_string(),
        reason,
    };

    let mut chars = raw.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(invalid("must start with an ASCII letter"))
        }
        Some(_) => {}
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(invalid("may only contain ASCII letters, digits and '_'"));
    }
    if raw.contains("__") {
        return Err(invalid("must not contain '__'"));
    }
    if raw.ends_with('_') {
        return Err(invalid("must not end with '_'"));
    }
    Ok(())
}
