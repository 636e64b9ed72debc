//! Occlusion-query based object picking.
//!
//! Each candidate object is drawn under its own occlusion query; objects
//! whose query saw any fragment pass become hits. A nearest pick runs two
//! sessions: a depth-tested first pass that leaves the closest depth in the
//! depth buffer, then an equal-depth second pass over the first pass's
//! survivors.

pub mod dummy;
mod hit;
mod mode;
mod picker;
mod query;
mod session;
mod state;

pub use hit::{CapacityExceeded, HitBuffer, HitRecord, DEPTH_UNKNOWN};
pub use mode::SelectMode;
pub use picker::{
    run_pass, select_all, select_nearest, DrawDriver, Picker, Selection,
};
pub use query::{QueryKind, SelectGpu};
pub use session::{SelectOutcome, SelectSession, DEBUG_GROUP};
pub use state::{
    DepthTest, Rect, RenderStateProvider, RenderStateSnapshot,
    TrackedRenderState, Viewport, WriteMask,
};
