//! Query pool contract a selection session drives.

use super::state::RenderStateProvider;
use crate::error::SelectError;

/// Kind of GPU query a pool holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Counts samples passing the depth and stencil tests.
    Occlusion,
}

/// A GPU a selection session can run on: render state plus a provider of
/// query pools.
///
/// Pools are plain values owned by the session; every pool operation goes
/// through the GPU because on real backends queries are recorded into the
/// same pass the draw calls land in.
pub trait SelectGpu: RenderStateProvider {
    /// Backend query pool.
    type Pool;

    /// Allocate an empty pool of `kind` queries.
    fn alloc_query_pool(&mut self, kind: QueryKind) -> Self::Pool;

    /// Begin the next query of `pool`. At most one query is open at a time.
    fn begin_query(&mut self, pool: &mut Self::Pool);

    /// End the open query of `pool`.
    fn end_query(&mut self, pool: &mut Self::Pool);

    /// Read one result per issued query, in issue order, into `results`.
    /// A non-zero entry means fragments passed while the query was open.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot produce the results.
    fn occlusion_results(
        &mut self,
        pool: &mut Self::Pool,
        results: &mut [u32],
    ) -> Result<(), SelectError>;

    /// Release a pool. Backends holding GPU objects free them here.
    fn free_query_pool(&mut self, _pool: Self::Pool) {}
}
