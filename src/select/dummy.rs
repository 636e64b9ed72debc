//! Dummy GPU for testing and development.
//!
//! Performs no GPU work. Draws are resolved against scripted visibility
//! sets, and every call is logged so tests can check how a session drove
//! the GPU.

use rustc_hash::FxHashSet;

use super::query::{QueryKind, SelectGpu};
use super::state::{
    DepthTest, RenderStateProvider, TrackedRenderState, Viewport, WriteMask,
};
use crate::error::SelectError;

/// One call observed by [`DummyGpu`].
#[derive(Debug, Clone, PartialEq)]
pub enum DummyEvent {
    /// A query pool was allocated.
    AllocPool,
    /// Query with this global index was begun.
    BeginQuery(usize),
    /// Query with this global index was ended.
    EndQuery(usize),
    /// An object was drawn under the given state.
    Draw {
        /// Drawn object.
        id: u32,
        /// Depth test at draw time.
        depth_test: DepthTest,
        /// Write mask at draw time.
        write_mask: WriteMask,
    },
    /// The depth buffer was cleared.
    ClearDepth(f32),
    /// A query pool was released.
    FreePool,
    /// A debug group was opened.
    PushDebugGroup(String),
    /// A debug group was closed.
    PopDebugGroup,
}

/// Query pool handed out by [`DummyGpu`]: a window into the GPU's global
/// query log.
#[derive(Debug)]
pub struct DummyPool {
    first: usize,
    count: usize,
}

/// CPU stand-in for a GPU.
///
/// An object drawn under an `Equal` depth test counts as visible when it is
/// in the nearest set (falling back to the visible set when none was
/// given); under every other test it counts when it is in the visible set.
#[derive(Debug)]
pub struct DummyGpu {
    state: TrackedRenderState,
    visible: FxHashSet<u32>,
    nearest: Option<FxHashSet<u32>>,
    /// Samples per query, for every query ever issued.
    samples: Vec<u32>,
    open_query: Option<usize>,
    events: Vec<DummyEvent>,
    overlapping_begins: usize,
    pools_allocated: usize,
    pools_freed: usize,
    fail_readback: bool,
}

impl DummyGpu {
    /// Create a dummy GPU with a `width` x `height` target and nothing
    /// visible.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: TrackedRenderState::new(width, height),
            visible: FxHashSet::default(),
            nearest: None,
            samples: Vec::new(),
            open_query: None,
            events: Vec::new(),
            overlapping_begins: 0,
            pools_allocated: 0,
            pools_freed: 0,
            fail_readback: false,
        }
    }

    /// Objects that produce samples when drawn.
    #[must_use]
    pub fn with_visible(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.visible = ids.into_iter().collect();
        self
    }

    /// Objects lying at the nearest depth, visible under an `Equal` test.
    #[must_use]
    pub fn with_nearest(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.nearest = Some(ids.into_iter().collect());
        self
    }

    /// Make the next [`SelectGpu::occlusion_results`] call fail.
    pub fn fail_next_readback(&mut self) {
        self.fail_readback = true;
    }

    /// Draw object `id` into the open query, if any.
    pub fn draw(&mut self, id: u32) {
        let depth_test = self.state.depth_test();
        self.events.push(DummyEvent::Draw {
            id,
            depth_test,
            write_mask: self.state.write_mask(),
        });

        let passes = match (depth_test, &self.nearest) {
            (DepthTest::Equal, Some(nearest)) => nearest.contains(&id),
            _ => self.visible.contains(&id),
        };
        let (width, height) = self.state.viewport().extent();
        if passes && width > 0 && height > 0 {
            if let Some(query) = self.open_query {
                self.samples[query] += width * height;
            }
        }
    }

    /// Every call observed so far.
    #[must_use]
    pub fn events(&self) -> &[DummyEvent] {
        &self.events
    }

    /// Forget observed calls.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Depth values of every clear observed so far.
    #[must_use]
    pub fn depth_clears(&self) -> Vec<f32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DummyEvent::ClearDepth(depth) => Some(*depth),
                _ => None,
            })
            .collect()
    }

    /// Queries begun while another was still open.
    #[must_use]
    pub fn overlapping_begins(&self) -> usize {
        self.overlapping_begins
    }

    /// Pools allocated so far.
    #[must_use]
    pub fn pools_allocated(&self) -> usize {
        self.pools_allocated
    }

    /// Pools released so far.
    #[must_use]
    pub fn pools_freed(&self) -> usize {
        self.pools_freed
    }

    /// Currently open debug groups.
    #[must_use]
    pub fn debug_groups(&self) -> &[String] {
        self.state.debug_groups()
    }
}

impl RenderStateProvider for DummyGpu {
    fn depth_test(&self) -> DepthTest {
        self.state.depth_test()
    }

    fn set_depth_test(&mut self, test: DepthTest) {
        self.state.set_depth_test(test);
    }

    fn write_mask(&self) -> WriteMask {
        self.state.write_mask()
    }

    fn set_write_mask(&mut self, mask: WriteMask) {
        self.state.set_write_mask(mask);
    }

    fn viewport(&self) -> Viewport {
        self.state.viewport()
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.set_viewport(viewport);
    }

    fn scissor(&self) -> Viewport {
        self.state.scissor()
    }

    fn set_scissor(&mut self, scissor: Viewport) {
        self.state.set_scissor(scissor);
    }

    fn scissor_test(&self) -> bool {
        self.state.scissor_test()
    }

    fn set_scissor_test(&mut self, enabled: bool) {
        self.state.set_scissor_test(enabled);
    }

    fn clear_depth(&mut self, depth: f32) {
        self.events.push(DummyEvent::ClearDepth(depth));
        self.state.clear_depth(depth);
    }

    fn push_debug_group(&mut self, label: &str) {
        self.events.push(DummyEvent::PushDebugGroup(label.to_owned()));
        self.state.push_debug_group(label);
    }

    fn pop_debug_group(&mut self) {
        self.events.push(DummyEvent::PopDebugGroup);
        self.state.pop_debug_group();
    }
}

impl SelectGpu for DummyGpu {
    type Pool = DummyPool;

    fn alloc_query_pool(&mut self, kind: QueryKind) -> DummyPool {
        log::trace!("DummyGpu: allocating {kind:?} query pool");
        self.events.push(DummyEvent::AllocPool);
        self.pools_allocated += 1;
        DummyPool {
            first: self.samples.len(),
            count: 0,
        }
    }

    fn begin_query(&mut self, pool: &mut DummyPool) {
        if self.open_query.is_some() {
            self.overlapping_begins += 1;
        }
        let index = self.samples.len();
        self.samples.push(0);
        pool.count += 1;
        self.open_query = Some(index);
        self.events.push(DummyEvent::BeginQuery(index));
    }

    fn end_query(&mut self, _pool: &mut DummyPool) {
        if let Some(index) = self.open_query.take() {
            self.events.push(DummyEvent::EndQuery(index));
        }
    }

    fn occlusion_results(
        &mut self,
        pool: &mut DummyPool,
        results: &mut [u32],
    ) -> Result<(), SelectError> {
        if self.fail_readback {
            self.fail_readback = false;
            return Err(SelectError::QueryReadback(
                "dummy readback failure".to_owned(),
            ));
        }
        let issued = &self.samples[pool.first..pool.first + pool.count];
        for (out, &samples) in results.iter_mut().zip(issued) {
            *out = samples;
        }
        Ok(())
    }

    fn free_query_pool(&mut self, _pool: DummyPool) {
        self.events.push(DummyEvent::FreePool);
        self.pools_freed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_outside_a_query_are_not_counted() {
        let mut gpu = DummyGpu::new(4, 4).with_visible([1]);
        gpu.draw(1);
        let mut pool = gpu.alloc_query_pool(QueryKind::Occlusion);
        gpu.begin_query(&mut pool);
        gpu.end_query(&mut pool);
        let mut results = [7];
        gpu.occlusion_results(&mut pool, &mut results).unwrap();
        assert_eq!(results, [0]);
    }

    #[test]
    fn equal_test_uses_nearest_set() {
        let mut gpu = DummyGpu::new(2, 2).with_visible([1, 2]).with_nearest([2]);
        gpu.set_depth_test(DepthTest::Equal);
        let mut pool = gpu.alloc_query_pool(QueryKind::Occlusion);
        for id in [1, 2] {
            gpu.begin_query(&mut pool);
            gpu.draw(id);
            gpu.end_query(&mut pool);
        }
        let mut results = [0; 2];
        gpu.occlusion_results(&mut pool, &mut results).unwrap();
        assert_eq!(results, [0, 4]);
    }

    #[test]
    fn pools_only_see_their_own_queries() {
        let mut gpu = DummyGpu::new(1, 1).with_visible([1]);
        let mut first = gpu.alloc_query_pool(QueryKind::Occlusion);
        gpu.begin_query(&mut first);
        gpu.draw(1);
        gpu.end_query(&mut first);

        let mut second = gpu.alloc_query_pool(QueryKind::Occlusion);
        gpu.begin_query(&mut second);
        gpu.end_query(&mut second);
        let mut results = [9];
        gpu.occlusion_results(&mut second, &mut results).unwrap();
        assert_eq!(results, [0]);
    }
}
