//! Per-axis sequences tagged with the dimension order they are stored in.
//!
//! OME-NGFF metadata lists axes slowest-varying first (e.g. `t, c, z, y, x`),
//! while in-memory array views usually iterate fastest-varying first
//! (`x, y, z, c, t`).
//! [DiskOrder] and [MemoryOrder] are distinct types so that every reversal
//! between the two is an explicit call.
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Values in on-disk (OME-NGFF JSON) axis order, slowest-varying first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiskOrder<T>(Vec<T>);

/// Values in in-memory axis order, fastest-varying first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryOrder<T>(Vec<T>);

impl<T> DiskOrder<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    /// Reverse into in-memory order.
    pub fn into_memory_order(self) -> MemoryOrder<T> {
        let mut values = self.0;
        values.reverse();
        MemoryOrder(values)
    }

    /// Index of the same axis in in-memory order.
    ///
    /// Returns None if `index` is out of range.
    pub fn memory_index(&self, index: usize) -> Option<usize> {
        (index < self.0.len()).then(|| self.0.len() - 1 - index)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> MemoryOrder<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    /// Reverse into on-disk order.
    pub fn into_disk_order(self) -> DiskOrder<T> {
        let mut values = self.0;
        values.reverse();
        DiskOrder(values)
    }

    /// Index of the same axis in on-disk order.
    ///
    /// Returns None if `index` is out of range.
    pub fn disk_index(&self, index: usize) -> Option<usize> {
        (index < self.0.len()).then(|| self.0.len() - 1 - index)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T: Clone> DiskOrder<T> {
    pub fn to_memory_order(&self) -> MemoryOrder<T> {
        self.clone().into_memory_order()
    }
}

impl<T: Clone> MemoryOrder<T> {
    pub fn to_disk_order(&self) -> DiskOrder<T> {
        self.clone().into_disk_order()
    }
}

impl<T> Deref for DiskOrder<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Deref for MemoryOrder<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
