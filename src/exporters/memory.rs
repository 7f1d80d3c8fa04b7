//! In-memory exporter

use crate::core::{Exporter, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Keeps every exported batch, readable through a [`MemoryHandle`]
#[derive(Debug, Default)]
pub struct MemoryExporter {
    handle: MemoryHandle,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays valid after the exporter moves into a target
    pub fn handle(&self) -> MemoryHandle {
        self.handle.clone()
    }
}

impl Exporter for MemoryExporter {
    fn export(&mut self, records: &[Value]) -> Result<()> {
        self.handle.batches.lock().push(records.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
    batches: Arc<Mutex<Vec<Vec<Value>>>>,
}

impl MemoryHandle {
    /// Copy of every batch exported so far, oldest first
    pub fn batches(&self) -> Vec<Vec<Value>> {
        self.batches.lock().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// All exported records, flattened across batches
    pub fn records(&self) -> Vec<Value> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    pub fn clear(&self) {
        self.batches.lock().clear();
    }
}
