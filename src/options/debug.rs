use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Debugging aids for the picking pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Debug", inline)]
#[serde(default)]
pub struct DebugOptions {
    /// Label GPU work with debug groups (visible in graphics debuggers).
    #[schemars(title = "Debug Groups")]
    pub debug_groups: bool,
    /// Log the ids of every pick at info level.
    #[schemars(title = "Log Hits")]
    pub log_hits: bool,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            debug_groups: true,
            log_hits: false,
        }
    }
}
