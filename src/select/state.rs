//! Render state touched by a selection session.
//!
//! A session saves the depth test, write mask, viewport and scissor of the
//! active target at `begin` and puts them back at `end`. The
//! [`RenderStateProvider`] trait is the seam to whatever owns that state;
//! [`TrackedRenderState`] is a plain in-memory implementation that GPU
//! targets consult when they build passes and pick pipelines.

use bitflags::bitflags;

/// Integer screen rectangle with inclusive-min / exclusive-max edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub xmin: i32,
    /// Right edge.
    pub xmax: i32,
    /// Bottom edge.
    pub ymin: i32,
    /// Top edge.
    pub ymax: i32,
}

impl Rect {
    /// Create a rectangle from its edges.
    #[must_use]
    pub fn new(xmin: i32, xmax: i32, ymin: i32, ymax: i32) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Square of half-size `radius` centred on a cursor position.
    #[must_use]
    pub fn around(x: i32, y: i32, radius: i32) -> Self {
        Self::new(x - radius, x + radius, y - radius, y + radius)
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }
}

/// Viewport or scissor box: origin plus size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Origin x.
    pub x: i32,
    /// Origin y.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Viewport {
    /// Create a viewport box.
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same origin, size taken from `rect`.
    #[must_use]
    pub fn shrunk_to(self, rect: &Rect) -> Self {
        Self::new(self.x, self.y, rect.width(), rect.height())
    }

    /// Width and height clamped to zero, as unsigned pixels.
    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        (self.width.max(0) as u32, self.height.max(0) as u32)
    }
}

/// Depth comparison applied to incoming fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthTest {
    /// Depth testing disabled.
    #[default]
    None,
    /// Always passes (testing nominally enabled).
    Always,
    /// Passes when nearer than the stored depth.
    Less,
    /// Passes when nearer than or equal to the stored depth.
    LessEqual,
    /// Passes only at exactly the stored depth.
    Equal,
    /// Passes when farther than the stored depth.
    Greater,
    /// Passes when farther than or equal to the stored depth.
    GreaterEqual,
}

impl DepthTest {
    /// Matching wgpu compare function. Disabled testing behaves like
    /// `Always`.
    #[must_use]
    pub fn to_compare_function(self) -> wgpu::CompareFunction {
        match self {
            Self::None | Self::Always => wgpu::CompareFunction::Always,
            Self::Less => wgpu::CompareFunction::Less,
            Self::LessEqual => wgpu::CompareFunction::LessEqual,
            Self::Equal => wgpu::CompareFunction::Equal,
            Self::Greater => wgpu::CompareFunction::Greater,
            Self::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        }
    }
}

bitflags! {
    /// Channels a draw is allowed to write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteMask: u8 {
        /// Red channel.
        const RED = 1 << 0;
        /// Green channel.
        const GREEN = 1 << 1;
        /// Blue channel.
        const BLUE = 1 << 2;
        /// Alpha channel.
        const ALPHA = 1 << 3;
        /// Depth buffer.
        const DEPTH = 1 << 4;
        /// All color channels.
        const COLOR = Self::RED.bits()
            | Self::GREEN.bits()
            | Self::BLUE.bits()
            | Self::ALPHA.bits();
    }
}

impl Default for WriteMask {
    fn default() -> Self {
        Self::all()
    }
}

impl WriteMask {
    /// Color part of the mask as wgpu color writes.
    #[must_use]
    pub fn to_color_writes(self) -> wgpu::ColorWrites {
        let mut writes = wgpu::ColorWrites::empty();
        if self.contains(Self::RED) {
            writes |= wgpu::ColorWrites::RED;
        }
        if self.contains(Self::GREEN) {
            writes |= wgpu::ColorWrites::GREEN;
        }
        if self.contains(Self::BLUE) {
            writes |= wgpu::ColorWrites::BLUE;
        }
        if self.contains(Self::ALPHA) {
            writes |= wgpu::ColorWrites::ALPHA;
        }
        writes
    }
}

/// State captured at session begin and restored at end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStateSnapshot {
    /// Viewport box.
    pub viewport: Viewport,
    /// Scissor box.
    pub scissor: Viewport,
    /// Whether scissor testing was enabled.
    pub scissor_test: bool,
    /// Write mask, including the depth-write bit.
    pub write_mask: WriteMask,
    /// Depth comparison.
    pub depth_test: DepthTest,
}

/// Get/set access to the render state a selection session changes.
pub trait RenderStateProvider {
    /// Current depth comparison.
    fn depth_test(&self) -> DepthTest;
    /// Change the depth comparison.
    fn set_depth_test(&mut self, test: DepthTest);
    /// Current write mask.
    fn write_mask(&self) -> WriteMask;
    /// Replace the write mask.
    fn set_write_mask(&mut self, mask: WriteMask);
    /// Current viewport.
    fn viewport(&self) -> Viewport;
    /// Change the viewport.
    fn set_viewport(&mut self, viewport: Viewport);
    /// Current scissor box.
    fn scissor(&self) -> Viewport;
    /// Change the scissor box.
    fn set_scissor(&mut self, scissor: Viewport);
    /// Whether scissor testing is enabled.
    fn scissor_test(&self) -> bool;
    /// Enable or disable scissor testing.
    fn set_scissor_test(&mut self, enabled: bool);
    /// Clear the depth attachment to `depth`.
    fn clear_depth(&mut self, depth: f32);

    /// Open a named debug group around the following GPU work.
    fn push_debug_group(&mut self, _label: &str) {}

    /// Close the innermost debug group.
    fn pop_debug_group(&mut self) {}

    /// Toggle the depth-write bit of the write mask.
    fn set_depth_write(&mut self, enabled: bool) {
        let mut mask = self.write_mask();
        mask.set(WriteMask::DEPTH, enabled);
        self.set_write_mask(mask);
    }

    /// Toggle all color bits of the write mask.
    fn set_color_write(&mut self, enabled: bool) {
        let mut mask = self.write_mask();
        mask.set(WriteMask::COLOR, enabled);
        self.set_write_mask(mask);
    }

    /// Capture the state a session restores.
    fn snapshot(&self) -> RenderStateSnapshot {
        RenderStateSnapshot {
            viewport: self.viewport(),
            scissor: self.scissor(),
            scissor_test: self.scissor_test(),
            write_mask: self.write_mask(),
            depth_test: self.depth_test(),
        }
    }

    /// Put back a snapshot taken with [`RenderStateProvider::snapshot`].
    fn restore(&mut self, snapshot: &RenderStateSnapshot) {
        self.set_write_mask(snapshot.write_mask);
        self.set_depth_test(snapshot.depth_test);
        self.set_viewport(snapshot.viewport);
        self.set_scissor(snapshot.scissor);
        self.set_scissor_test(snapshot.scissor_test);
    }
}

/// In-memory render state.
///
/// GPU targets keep one of these as the source of truth and translate it to
/// pass commands and pipeline descriptors on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRenderState {
    depth_test: DepthTest,
    write_mask: WriteMask,
    viewport: Viewport,
    scissor: Viewport,
    scissor_test: bool,
    pending_depth_clear: Option<f32>,
    debug_groups: Vec<String>,
}

impl TrackedRenderState {
    /// Fresh state covering a `width` x `height` target: depth testing off,
    /// every channel writable, scissor test off.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let full = Viewport::new(0, 0, width as i32, height as i32);
        Self {
            depth_test: DepthTest::None,
            write_mask: WriteMask::all(),
            viewport: full,
            scissor: full,
            scissor_test: false,
            pending_depth_clear: None,
            debug_groups: Vec::new(),
        }
    }

    /// Depth-stencil state for a pipeline matching the current policy.
    #[must_use]
    pub fn depth_stencil_state(
        &self,
        format: wgpu::TextureFormat,
    ) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.write_mask.contains(WriteMask::DEPTH),
            depth_compare: self.depth_test.to_compare_function(),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    /// Color writes for a pipeline matching the current mask.
    #[must_use]
    pub fn color_writes(&self) -> wgpu::ColorWrites {
        self.write_mask.to_color_writes()
    }

    /// Depth clear requested since the last call, if any.
    pub fn take_depth_clear(&mut self) -> Option<f32> {
        self.pending_depth_clear.take()
    }

    /// Currently open debug groups, outermost first.
    #[must_use]
    pub fn debug_groups(&self) -> &[String] {
        &self.debug_groups
    }
}

impl RenderStateProvider for TrackedRenderState {
    fn depth_test(&self) -> DepthTest {
        self.depth_test
    }

    fn set_depth_test(&mut self, test: DepthTest) {
        self.depth_test = test;
    }

    fn write_mask(&self) -> WriteMask {
        self.write_mask
    }

    fn set_write_mask(&mut self, mask: WriteMask) {
        self.write_mask = mask;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn scissor(&self) -> Viewport {
        self.scissor
    }

    fn set_scissor(&mut self, scissor: Viewport) {
        self.scissor = scissor;
    }

    fn scissor_test(&self) -> bool {
        self.scissor_test
    }

    fn set_scissor_test(&mut self, enabled: bool) {
        self.scissor_test = enabled;
    }

    fn clear_depth(&mut self, depth: f32) {
        self.pending_depth_clear = Some(depth);
    }

    fn push_debug_group(&mut self, label: &str) {
        self.debug_groups.push(label.to_owned());
    }

    fn pop_debug_group(&mut self) {
        let _ = self.debug_groups.pop();
    }
}
