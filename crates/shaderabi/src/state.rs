//! Host-side lifecycle of a shader's persistent state.
//!
//! The storage is zero until the initialization hook has run exactly once;
//! only then may per-invocation stages see it. Invocations receive the state
//! by mutable reference and their writes are visible to every later
//! invocation. The shader side offers no atomicity: concurrent invocations of
//! one dispatch race on read-modify-write, and nothing here changes that.
use std::any::type_name;

use bytemuck::Pod;

use crate::environment::Environment;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("persistent state {0} used before its initialization hook ran")]
    NotInitialized(&'static str),
    #[error("persistent state {0} was already initialized")]
    AlreadyInitialized(&'static str),
    #[error("persistent state {ty} expects {expected} bytes, got {actual}")]
    Size {
        ty: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Ready,
}

#[derive(Debug, Clone)]
pub struct PersistentState<K> {
    value: K,
    phase: Phase,
    invocations: u64,
}

impl<K: Pod> PersistentState<K> {
    pub fn new() -> Self {
        Self {
            value: K::zeroed(),
            phase: Phase::Uninitialized,
            invocations: 0,
        }
    }

    /// Adopts bytes read back from a GPU buffer after the initialization
    /// kernel finished, marking the state ready.
    pub fn from_initialized_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        let expected = std::mem::size_of::<K>();
        if bytes.len() != expected {
            return Err(StateError::Size {
                ty: type_name::<K>(),
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            value: bytemuck::pod_read_unaligned(bytes),
            phase: Phase::Ready,
            invocations: 0,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Zeroes the state and runs `hook` once against it.
    pub fn initialize<F>(&mut self, environment: &Environment, hook: F) -> Result<(), StateError>
    where
        F: FnOnce(&Environment, &mut K),
    {
        if self.phase == Phase::Ready {
            return Err(StateError::AlreadyInitialized(type_name::<K>()));
        }
        self.value = K::zeroed();
        hook(environment, &mut self.value);
        self.phase = Phase::Ready;
        tracing::debug!(state = type_name::<K>(), "persistent state initialized");
        Ok(())
    }

    pub fn invoke<F, R>(&mut self, environment: &Environment, stage: F) -> Result<R, StateError>
    where
        F: FnOnce(&Environment, &mut K) -> R,
    {
        if self.phase != Phase::Ready {
            return Err(StateError::NotInitialized(type_name::<K>()));
        }
        self.invocations = self.invocations.saturating_add(1);
        Ok(stage(environment, &mut self.value))
    }

    pub fn get(&self) -> Option<&K> {
        match self.phase {
            Phase::Ready => Some(&self.value),
            Phase::Uninitialized => None,
        }
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Returns to the uninitialized phase, e.g. when the shader is reloaded.
    pub fn reset(&mut self) {
        self.value = K::zeroed();
        self.phase = Phase::Uninitialized;
        self.invocations = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.value)
    }
}

impl<K: Pod> Default for PersistentState<K> {
    fn default() -> Self {
        Self::new()
    }
}
