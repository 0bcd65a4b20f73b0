//! Single-flight guards for administrative operations.
//!
//! At most one instance of a named operation runs at a time. A second caller
//! is turned away immediately instead of waiting.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

/// Tracks operations that currently hold their single-flight slot.
#[derive(Debug, Default, Clone)]
pub struct InFlightOperations {
    running: Arc<DashMap<&'static str, ()>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InFlightError {
    #[error("{operation} already in progress")]
    AlreadyRunning { operation: &'static str },
}

impl InFlightOperations {
    pub fn new() -> Self {
        Self {
            running: Arc::new(DashMap::new()),
        }
    }

    /// Claim the slot for `operation`; the slot is released when the guard drops.
    pub fn acquire(&self, operation: &'static str) -> Result<FlightGuard, InFlightError> {
        use dashmap::mapref::entry::Entry;

        match self.running.entry(operation) {
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Ok(FlightGuard {
                    operation,
                    running: Arc::clone(&self.running),
                })
            }
            Entry::Occupied(_) => Err(InFlightError::AlreadyRunning { operation }),
        }
    }

    pub fn is_running(&self, operation: &str) -> bool {
        self.running.contains_key(operation)
    }
}

#[derive(Debug)]
pub struct FlightGuard {
    operation: &'static str,
    running: Arc<DashMap<&'static str, ()>>,
}

impl FlightGuard {
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.running.remove(self.operation);
    }
}
