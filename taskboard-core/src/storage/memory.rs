use super::{Persistence, StorageError};
use crate::types::BoardData;

/// No-op persistence: the in-memory document is the only copy.
#[derive(Debug, Default)]
pub struct MemoryPersistence;

impl MemoryPersistence {
    pub fn new() -> Self {
        Self
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<BoardData, StorageError> {
        Ok(BoardData::default())
    }

    fn save(&self, _data: &BoardData) -> Result<(), StorageError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
