//! Headless picking demo.
//!
//! Draws a stack of overlapping quads into an offscreen wgpu target, then
//! picks under a cursor position with a single `All` pass and with the
//! two-pass nearest technique, logging what each finds.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use glam::{Vec2, Vec3};
use gpu_select::options::Options;
use gpu_select::select::{
    DepthTest, DrawDriver, Picker, Rect, RenderStateProvider, WriteMask,
};
use gpu_select::wgpu_target::{WgpuSelectTarget, COLOR_FORMAT};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

/// Quad shader. Its clip position is `@invariant` so the equal-depth second
/// pass reproduces the first pass's depths exactly.
const QUAD_SHADER: &str = include_str!("../assets/shaders/select_quad.wgsl");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PickMode {
    All,
    Nearest,
    Both,
}

/// Pick overlapping quads with GPU occlusion queries.
#[derive(Debug, Parser)]
#[command(name = "gpu-select")]
struct Args {
    /// TOML options file; defaults are used when omitted.
    #[arg(long)]
    options: Option<PathBuf>,
    /// Number of quads to stack.
    #[arg(long, default_value_t = 5)]
    quads: u32,
    /// Cursor x in pixels (defaults to the target centre).
    #[arg(long)]
    x: Option<i32>,
    /// Cursor y in pixels (defaults to the target centre).
    #[arg(long)]
    y: Option<i32>,
    /// Which picks to run.
    #[arg(long, value_enum, default_value_t = PickMode::Both)]
    mode: PickMode,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
}

/// Screen-space quad with a constant depth.
#[derive(Debug, Clone, Copy)]
struct Quad {
    id: u32,
    min: Vec2,
    max: Vec2,
    depth: f32,
}

/// Quads plus the pipelines needed to draw them under each depth policy.
struct QuadScene {
    quads: Vec<Quad>,
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<(DepthTest, WriteMask), wgpu::RenderPipeline>,
    vertex_buffer: Option<wgpu::Buffer>,
}

impl QuadScene {
    /// Stack `count` quads around the target centre, each one nearer and
    /// slightly smaller than the last.
    fn stacked(device: &wgpu::Device, size: (u32, u32), count: u32) -> Self {
        let centre = Vec2::new(size.0 as f32, size.1 as f32) * 0.5;
        let quads = (0..count)
            .map(|i| {
                let half = Vec2::splat(96.0 - 12.0 * i as f32).max(Vec2::ONE);
                let shift = Vec2::new(6.0 * i as f32, -4.0 * i as f32);
                Quad {
                    id: 100 + i,
                    min: centre + shift - half,
                    max: centre + shift + half,
                    depth: 0.9 - 0.8 * i as f32 / count.max(1) as f32,
                }
            })
            .collect();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Selection Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(QUAD_SHADER.into()),
        });
        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Selection Quad Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        Self {
            quads,
            shader,
            layout,
            pipelines: FxHashMap::default(),
            vertex_buffer: None,
        }
    }

    /// Map every quad into clip space of the picking region and upload.
    fn prepare(&mut self, device: &wgpu::Device, region: &Rect) {
        let origin = Vec2::new(region.xmin as f32, region.ymin as f32);
        let extent =
            Vec2::new(region.width() as f32, region.height() as f32).max(Vec2::ONE);
        let to_clip = |p: Vec2, depth: f32| {
            let uv = (p - origin) / extent;
            Vec3::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, depth)
        };

        let vertices: Vec<Vertex> = self
            .quads
            .iter()
            .flat_map(|q| {
                let a = to_clip(q.min, q.depth);
                let b = to_clip(Vec2::new(q.max.x, q.min.y), q.depth);
                let c = to_clip(q.max, q.depth);
                let d = to_clip(Vec2::new(q.min.x, q.max.y), q.depth);
                [a, b, c, a, c, d]
            })
            .map(|p| Vertex {
                position: p.to_array(),
            })
            .collect();

        self.vertex_buffer = Some(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Selection Quad Vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
    }

    fn pipeline(&mut self, target: &WgpuSelectTarget) -> &wgpu::RenderPipeline {
        let key = (target.depth_test(), target.write_mask());
        let (shader, layout) = (&self.shader, &self.layout);
        self.pipelines.entry(key).or_insert_with(|| {
            log::debug!("creating quad pipeline for {key:?}");
            target.device().create_render_pipeline(
                &wgpu::RenderPipelineDescriptor {
                    label: Some("Selection Quad Pipeline"),
                    layout: Some(layout),
                    vertex: wgpu::VertexState {
                        module: shader,
                        entry_point: Some("vs_main"),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: size_of::<Vertex>()
                                as wgpu::BufferAddress,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                        }],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: COLOR_FORMAT,
                            blend: None,
                            write_mask: target.color_writes(),
                        })],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(target.depth_stencil_state()),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                },
            )
        })
    }
}

impl DrawDriver<WgpuSelectTarget> for QuadScene {
    fn candidates(&self) -> Vec<u32> {
        self.quads.iter().map(|q| q.id).collect()
    }

    fn draw(&mut self, gpu: &mut WgpuSelectTarget, id: u32) {
        let Some(index) = self.quads.iter().position(|q| q.id == id) else {
            return;
        };
        let pipeline = self.pipeline(gpu).clone();
        let (Some(vertex_buffer), Some(pass)) =
            (self.vertex_buffer.as_ref(), gpu.render_pass())
        else {
            return;
        };
        let first = index as u32 * 6;
        pass.set_pipeline(&pipeline);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.draw(first..first + 6, 0..1);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let args = Args::parse();
    let options = match &args.options {
        Some(path) => Options::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Options::default(),
    };

    let mut target = pollster::block_on(WgpuSelectTarget::headless(&options))
        .context("creating selection target")?;
    let (width, height) = target.size();
    let cursor_x = args.x.unwrap_or(width as i32 / 2);
    let cursor_y = args.y.unwrap_or(height as i32 / 2);
    let region = Rect::around(cursor_x, cursor_y, options.select.pick_radius);

    let mut scene = QuadScene::stacked(target.device(), (width, height), args.quads);
    scene.prepare(target.device(), &region);
    let mut picker = Picker::new(&options);

    if matches!(args.mode, PickMode::All | PickMode::Both) {
        let outcome = picker.pick_all(&mut target, &mut scene, region)?;
        match outcome.hit_count() {
            Some(n) => log::info!(
                "all: {n} hits under ({cursor_x}, {cursor_y}): {:?}",
                picker.hits().ids()
            ),
            None => log::warn!(
                "all: more than {} hits, enlarge select.buffer_capacity",
                options.select.buffer_capacity
            ),
        }
    }

    if matches!(args.mode, PickMode::Nearest | PickMode::Both) {
        let selection = picker.pick_nearest(&mut target, &mut scene, region)?;
        match (selection.outcome.is_overflow(), selection.nearest) {
            (true, _) => log::warn!("nearest: first pass overflowed"),
            (false, Some(hit)) => {
                log::info!("nearest: object {} under ({cursor_x}, {cursor_y})", hit.id);
            }
            (false, None) => log::info!("nearest: nothing under the cursor"),
        }
    }

    Ok(())
}
