use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Picking buffer and query pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Selection", inline)]
#[serde(default)]
pub struct SelectOptions {
    /// Maximum number of hit records a pick may return.
    #[schemars(title = "Hit Buffer Capacity", range(min = 1, max = 65536))]
    pub buffer_capacity: usize,
    /// Queries per occlusion query set on GPU targets. A session allocates
    /// further sets when one fills up.
    #[schemars(title = "Query Set Size", range(min = 1, max = 4096))]
    pub query_pool_capacity: u32,
    /// Half-size in pixels of the square picking region around the cursor.
    #[schemars(title = "Pick Radius", range(min = 1, max = 64))]
    pub pick_radius: i32,
    /// Offscreen target size `[width, height]` for headless picking.
    #[schemars(skip)]
    pub target_size: [u32; 2],
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 2500,
            query_pool_capacity: 4096,
            pick_radius: 5,
            target_size: [512, 512],
        }
    }
}
