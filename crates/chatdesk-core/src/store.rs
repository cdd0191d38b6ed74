//! Per-session flag storage

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::Result;

/// Key of the flag set once contact details were submitted
pub const CONVERSATION_COMPLETED: &str = "conversation_completed";

/// Small key/value store scoped to one client session
pub trait FlagStore: Send + Sync {
    fn get_flag(&self, key: &str) -> Result<bool>;
    fn set_flag(&self, key: &str, value: bool) -> Result<()>;
    fn remove_flag(&self, key: &str) -> Result<()>;
}

/// In-memory store; flags are lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<String, bool>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(self.flags.lock().get(key).copied().unwrap_or(false))
    }

    fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.flags.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_flag(&self, key: &str) -> Result<()> {
        self.flags.lock().remove(key);
        Ok(())
    }
}
