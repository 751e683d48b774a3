//! Optimistic-concurrency wrapper

use serde::{Deserialize, Serialize};

/// A value paired with its store version.
///
/// Writers pass the version they read back to the store; the store
/// rejects the write if the record has moved on in the meantime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn initial(value: T) -> Self {
        Self { version: 1, value }
    }

    pub fn next(self, value: T) -> Self {
        Self {
            version: self.version + 1,
            value,
        }
    }
}
