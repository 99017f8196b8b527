//! Fixed-capacity circular sample store.
//!
//! Slots that have never been written are absent rather than zero, so a
//! partially filled buffer averages only real samples.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Last `capacity` samples in insertion order, oldest overwritten first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawBuffer<T>",
    bound(deserialize = "T: Deserialize<'de> + Clone")
)]
pub struct RollingBuffer<T = f64> {
    slots: Vec<Option<T>>,
    /// Next slot to be written.
    cursor: usize,
}

/// Serialized layout, checked before it becomes a [`RollingBuffer`].
#[derive(Deserialize)]
struct RawBuffer<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
}

impl<T> TryFrom<RawBuffer<T>> for RollingBuffer<T> {
    type Error = ControlError;

    fn try_from(raw: RawBuffer<T>) -> ControlResult<Self> {
        if raw.slots.is_empty() {
            return Err(ControlError::InvalidArg {
                what: "buffer capacity must be positive",
            });
        }
        if raw.cursor >= raw.slots.len() {
            return Err(ControlError::InvalidArg {
                what: "buffer cursor out of range",
            });
        }
        Ok(Self {
            slots: raw.slots,
            cursor: raw.cursor,
        })
    }
}

impl<T: Clone> RollingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns error if `capacity` is zero.
    pub fn new(capacity: usize) -> ControlResult<Self> {
        if capacity == 0 {
            return Err(ControlError::InvalidArg {
                what: "buffer capacity must be positive",
            });
        }
        Ok(Self {
            slots: vec![None; capacity],
            cursor: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        if self.slots[self.cursor].is_some() {
            // Wrapped at least once: every slot holds a sample.
            self.capacity()
        } else {
            self.cursor
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the slot at the cursor and advance it.
    pub fn write(&mut self, sample: T) {
        self.slots[self.cursor] = Some(sample);
        self.cursor = (self.cursor + 1) % self.capacity();
    }

    /// Most recently written sample, `None` before the first write.
    pub fn read_latest(&self) -> Option<&T> {
        let last = (self.cursor + self.capacity() - 1) % self.capacity();
        self.slots[last].as_ref()
    }

    /// Populated samples, oldest first.
    pub fn read_all(&self) -> Vec<T> {
        let (newer, older) = self.slots.split_at(self.cursor);
        older
            .iter()
            .chain(newer.iter())
            .filter_map(|slot| slot.clone())
            .collect()
    }
}

impl RollingBuffer<f64> {
    /// Mean of the populated samples, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        let (sum, count) = self
            .slots
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}
