use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::ladder::DrillProgress;

const SCHEMA_VERSION: u32 = 1;

/// The single persisted blob: every drill's tempo progression, keyed by
/// drill id. Loaded fail-soft — any mismatch or corruption yields the
/// default instead of an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressData {
    pub schema_version: u32,
    pub drills: HashMap<String, DrillProgress>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            drills: HashMap::new(),
        }
    }
}

impl ProgressData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
