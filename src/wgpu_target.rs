//! wgpu implementation of [`SelectGpu`].
//!
//! Renders into an offscreen color + depth target. The render pass is begun
//! lazily on the first query of a session, with the session's current
//! occlusion query set attached, and ended when results are read back. When
//! a set fills up the pass is ended and the session continues in a new pass
//! on a fresh set. Viewport and
//! scissor changes are applied to the live pass; depth test and write mask
//! are pipeline state, so draw drivers pick a pipeline matching
//! [`WgpuSelectTarget::depth_stencil_state`] and
//! [`WgpuSelectTarget::color_writes`].

use std::sync::mpsc;

use crate::error::SelectError;
use crate::options::Options;
use crate::select::{
    DepthTest, QueryKind, RenderStateProvider, SelectGpu, TrackedRenderState,
    Viewport, WriteMask,
};

/// Color format of the offscreen target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Depth format of the offscreen target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Largest occlusion query set wgpu accepts.
const MAX_QUERIES: u32 = 4096;
/// Bytes per resolved occlusion result.
const RESULT_SIZE: u64 = size_of::<u64>() as u64;
/// Query sets are sized in multiples of this so every set resolves at a
/// `QUERY_RESOLVE_BUFFER_ALIGNMENT` offset.
const SET_GRANULE: u32 =
    (wgpu::QUERY_RESOLVE_BUFFER_ALIGNMENT / RESULT_SIZE) as u32;

/// Occlusion queries owned by one selection session.
///
/// Starts with one query set and appends another each time the last one
/// fills up, so a session can issue any number of queries.
pub struct WgpuOcclusionPool {
    sets: Vec<wgpu::QuerySet>,
    per_set: u32,
    issued: u32,
    open: bool,
}

/// Set index and index within that set of global query `index`.
fn locate(index: u32, per_set: u32) -> (usize, u32) {
    ((index / per_set) as usize, index % per_set)
}

/// One `(set, queries, byte offset)` resolve per set, in issue order.
fn resolve_plan(
    issued: u32,
    per_set: u32,
) -> impl Iterator<Item = (usize, std::ops::Range<u32>, u64)> {
    (0..issued.div_ceil(per_set)).map(move |set| {
        let first = set * per_set;
        let count = per_set.min(issued - first);
        (set as usize, 0..count, u64::from(first) * RESULT_SIZE)
    })
}

/// Turn resolved `u64` sample counts into `0`/`1` results.
fn decode_results(data: &[u8], results: &mut [u32]) {
    for (out, chunk) in
        results.iter_mut().zip(data.chunks_exact(RESULT_SIZE as usize))
    {
        let samples: u64 = bytemuck::pod_read_unaligned(chunk);
        *out = u32::from(samples != 0);
    }
}

/// Offscreen wgpu target that selection sessions run on.
pub struct WgpuSelectTarget {
    device: wgpu::Device,
    queue: wgpu::Queue,
    /// Color attachment (kept alive alongside its view).
    _color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
    state: TrackedRenderState,
    query_capacity: u32,
    debug_groups: bool,
    /// Debug groups open on `encoder`.
    debug_depth: usize,
    encoder: Option<wgpu::CommandEncoder>,
    pass: Option<wgpu::RenderPass<'static>>,
}

impl WgpuSelectTarget {
    /// Create a target on an existing device, sized from
    /// `options.select.target_size`.
    #[must_use]
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        options: &Options,
    ) -> Self {
        let [width, height] = options.select.target_size;
        let (width, height) = (width.max(1), height.max(1));
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Selection Color Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Selection Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view =
            color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view =
            depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let query_capacity = options
            .select
            .query_pool_capacity
            .clamp(1, MAX_QUERIES)
            .next_multiple_of(SET_GRANULE);
        if query_capacity != options.select.query_pool_capacity {
            log::warn!(
                "query set size {} adjusted to {query_capacity}",
                options.select.query_pool_capacity
            );
        }

        Self {
            device,
            queue,
            _color_texture: color_texture,
            color_view,
            _depth_texture: depth_texture,
            depth_view,
            width,
            height,
            state: TrackedRenderState::new(width, height),
            query_capacity,
            debug_groups: options.debug.debug_groups,
            debug_depth: 0,
            encoder: None,
            pass: None,
        }
    }

    /// Create a target on a freshly requested adapter and device, without a
    /// surface.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::Adapter` or `SelectError::Gpu` if no adapter
    /// or device is available.
    pub async fn headless(options: &Options) -> Result<Self, SelectError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await?;
        log::info!("selection adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Selection Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;

        Ok(Self::new(device, queue, options))
    }

    /// The wgpu device.
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Target size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Depth-stencil state matching the current depth policy.
    #[must_use]
    pub fn depth_stencil_state(&self) -> wgpu::DepthStencilState {
        self.state.depth_stencil_state(DEPTH_FORMAT)
    }

    /// Color writes matching the current write mask.
    #[must_use]
    pub fn color_writes(&self) -> wgpu::ColorWrites {
        self.state.color_writes()
    }

    /// Live render pass, if a query has been begun and results not yet
    /// read.
    pub fn render_pass(&mut self) -> Option<&mut wgpu::RenderPass<'static>> {
        self.pass.as_mut()
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self
            .encoder
            .get_or_insert_with(|| create_encoder(&self.device))
    }

    fn ensure_pass(&mut self, query_set: &wgpu::QuerySet) {
        if self.pass.is_some() {
            return;
        }
        let depth_load = match self.state.take_depth_clear() {
            Some(depth) => wgpu::LoadOp::Clear(depth),
            None => wgpu::LoadOp::Load,
        };
        let encoder = self
            .encoder
            .get_or_insert_with(|| create_encoder(&self.device));
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Selection Query Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(
                    wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    },
                ),
                timestamp_writes: None,
                occlusion_query_set: Some(query_set),
            })
            .forget_lifetime();
        apply_viewport(&mut pass, &self.state, self.width, self.height);
        apply_scissor(&mut pass, &self.state, self.width, self.height);
        self.pass = Some(pass);
    }

    fn end_pass(&mut self) {
        self.pass = None;
    }

    /// Close every debug group still open on the encoder so it can be
    /// finished.
    fn close_debug_groups(&mut self) {
        while self.debug_depth > 0 {
            self.encoder().pop_debug_group();
            self.debug_depth -= 1;
        }
    }

    fn read_results(
        &mut self,
        pool: &WgpuOcclusionPool,
        results: &mut [u32],
    ) -> Result<(), SelectError> {
        results.fill(0);
        if pool.issued == 0 {
            return Ok(());
        }

        let size = u64::from(pool.issued) * RESULT_SIZE;
        let resolve_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Selection Query Resolve"),
            size,
            usage: wgpu::BufferUsages::QUERY_RESOLVE
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Selection Query Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.close_debug_groups();
        let mut encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| create_encoder(&self.device));
        for (set, queries, offset) in resolve_plan(pool.issued, pool.per_set) {
            encoder.resolve_query_set(
                &pool.sets[set],
                queries,
                &resolve_buffer,
                offset,
            );
        }
        encoder.copy_buffer_to_buffer(
            &resolve_buffer,
            0,
            &staging_buffer,
            0,
            size,
        );
        let _ = self.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self
            .device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| SelectError::QueryReadback(e.to_string()))?;
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SelectError::QueryReadback(e.to_string())),
            Err(e) => return Err(SelectError::QueryReadback(e.to_string())),
        }

        decode_results(&buffer_slice.get_mapped_range(), results);
        staging_buffer.unmap();
        Ok(())
    }
}

fn create_encoder(device: &wgpu::Device) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Selection Encoder"),
    })
}

fn clamp_box(view: Viewport, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x = view.x.clamp(0, width as i32 - 1) as u32;
    let y = view.y.clamp(0, height as i32 - 1) as u32;
    let (w, h) = view.extent();
    (x, y, w.clamp(1, width - x), h.clamp(1, height - y))
}

fn apply_viewport(
    pass: &mut wgpu::RenderPass<'static>,
    state: &TrackedRenderState,
    width: u32,
    height: u32,
) {
    let (x, y, w, h) = clamp_box(state.viewport(), width, height);
    pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
}

fn apply_scissor(
    pass: &mut wgpu::RenderPass<'static>,
    state: &TrackedRenderState,
    width: u32,
    height: u32,
) {
    if state.scissor_test() {
        let (x, y, w, h) = clamp_box(state.scissor(), width, height);
        pass.set_scissor_rect(x, y, w, h);
    } else {
        pass.set_scissor_rect(0, 0, width, height);
    }
}

impl RenderStateProvider for WgpuSelectTarget {
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
        if let Some(pass) = self.pass.as_mut() {
            apply_viewport(pass, &self.state, self.width, self.height);
        }
    }

    fn scissor(&self) -> Viewport {
        self.state.scissor()
    }

    fn set_scissor(&mut self, scissor: Viewport) {
        self.state.set_scissor(scissor);
        if let Some(pass) = self.pass.as_mut() {
            apply_scissor(pass, &self.state, self.width, self.height);
        }
    }

    fn scissor_test(&self) -> bool {
        self.state.scissor_test()
    }

    fn set_scissor_test(&mut self, enabled: bool) {
        self.state.set_scissor_test(enabled);
        if let Some(pass) = self.pass.as_mut() {
            apply_scissor(pass, &self.state, self.width, self.height);
        }
    }

    fn clear_depth(&mut self, depth: f32) {
        // Clears happen at pass load; a live pass has to be restarted.
        self.end_pass();
        self.state.clear_depth(depth);
    }

    fn push_debug_group(&mut self, label: &str) {
        if !self.debug_groups {
            return;
        }
        if let Some(pass) = self.pass.as_mut() {
            pass.insert_debug_marker(label);
            return;
        }
        self.encoder().push_debug_group(label);
        self.debug_depth += 1;
    }

    fn pop_debug_group(&mut self) {
        if self.debug_depth > 0 && self.pass.is_none() {
            self.encoder().pop_debug_group();
            self.debug_depth -= 1;
        }
    }
}

impl WgpuSelectTarget {
    fn create_query_set(&self, kind: QueryKind) -> wgpu::QuerySet {
        let ty = match kind {
            QueryKind::Occlusion => wgpu::QueryType::Occlusion,
        };
        self.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("Selection Query Set"),
            ty,
            count: self.query_capacity,
        })
    }
}

impl SelectGpu for WgpuSelectTarget {
    type Pool = WgpuOcclusionPool;

    fn alloc_query_pool(&mut self, kind: QueryKind) -> WgpuOcclusionPool {
        WgpuOcclusionPool {
            sets: vec![self.create_query_set(kind)],
            per_set: self.query_capacity,
            issued: 0,
            open: false,
        }
    }

    fn begin_query(&mut self, pool: &mut WgpuOcclusionPool) {
        let (set, index) = locate(pool.issued, pool.per_set);
        if set == pool.sets.len() {
            // A pass is bound to one query set; continue in a new pass that
            // loads the depth written so far.
            self.end_pass();
            pool.sets.push(self.create_query_set(QueryKind::Occlusion));
            log::debug!(
                "query set {set} allocated after {} queries",
                pool.issued
            );
        }
        self.ensure_pass(&pool.sets[set]);
        if let Some(pass) = self.pass.as_mut() {
            pass.begin_occlusion_query(index);
            pool.issued += 1;
            pool.open = true;
        }
    }

    fn end_query(&mut self, pool: &mut WgpuOcclusionPool) {
        if !pool.open {
            return;
        }
        if let Some(pass) = self.pass.as_mut() {
            pass.end_occlusion_query();
        }
        pool.open = false;
    }

    fn occlusion_results(
        &mut self,
        pool: &mut WgpuOcclusionPool,
        results: &mut [u32],
    ) -> Result<(), SelectError> {
        self.end_query(pool);
        self.end_pass();
        self.read_results(pool, results)
    }

    fn free_query_pool(&mut self, pool: WgpuOcclusionPool) {
        self.end_pass();
        log::trace!(
            "releasing {} query sets after {} queries",
            pool.sets.len(),
            pool.issued
        );
    }
}
