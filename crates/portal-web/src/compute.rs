//! WebGPU compute backend: parallel particle update plus instanced draw.
//!
//! The capability probe is the construction itself — instance, surface,
//! adapter, device. Any failure surfaces as a `PortalError` and the
//! controller falls back to the Canvas2D software path; nothing is ever
//! re-probed per frame.

use glam::Vec2;
use portal_core::constants::*;
use portal_core::{
    particle_count_for_area, BackendKind, FieldDrivers, PortalError, SimulationBackend,
};
use rand::prelude::*;
use web_sys as web;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameParams {
    target: [f32; 2],
    dt: f32,
    energy: f32,
}

pub struct ComputePortal {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    compute_pipeline: wgpu::ComputePipeline,
    render_pipeline: wgpu::RenderPipeline,
    compute_bind_group: wgpu::BindGroup,
    render_bind_group: wgpu::BindGroup,

    // Created once at init, rewritten (params) or updated in place (storage)
    // every frame, released together at teardown. Never reallocated.
    #[allow(dead_code)]
    position_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    velocity_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,

    particle_count: u32,
    width: u32,
    height: u32,
}

impl ComputePortal {
    pub async fn new(canvas: &web::HtmlCanvasElement) -> Result<Self, PortalError> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| PortalError::Surface(format!("{e:?}")))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(PortalError::CapabilityUnavailable)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| PortalError::DeviceCreation(format!("{e:?}")))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .unwrap_or(caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let particle_count = particle_count_for_area(
            width as f32,
            height as f32,
            COMPUTE_AREA_PER_PARTICLE,
            COMPUTE_PARTICLE_CAP,
        );

        // Seed positions on an NDC annulus, sqrt-weighted toward the center;
        // velocities start at zero.
        let mut rng = rand::thread_rng();
        let mut positions = Vec::with_capacity(particle_count as usize);
        for _ in 0..particle_count {
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let dist = rng.gen::<f32>().sqrt() * COMPUTE_SPAWN_RADIUS_NDC;
            positions.push([angle.cos() * dist, angle.sin() * dist]);
        }
        let velocities = vec![[0.0f32; 2]; particle_count as usize];

        let position_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("portal_positions"),
            size: (particle_count as u64) * 8,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let velocity_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("portal_velocities"),
            size: (particle_count as u64) * 8,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&position_buffer, 0, bytemuck::cast_slice(&positions));
        queue.write_buffer(&velocity_buffer, 0, bytemuck::cast_slice(&velocities));

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("portal_params"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let compute_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("portal_compute"),
            source: wgpu::ShaderSource::Wgsl(portal_core::PORTAL_COMPUTE_WGSL.into()),
        });
        let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("portal_draw"),
            source: wgpu::ShaderSource::Wgsl(portal_core::PORTAL_DRAW_WGSL.into()),
        });

        let storage_entry = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: if read_only {
                wgpu::ShaderStages::VERTEX
            } else {
                wgpu::ShaderStages::COMPUTE
            },
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let compute_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("portal_compute_bgl"),
            entries: &[
                storage_entry(0, false),
                storage_entry(1, false),
                uniform_entry(2, wgpu::ShaderStages::COMPUTE),
            ],
        });
        let render_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("portal_render_bgl"),
            entries: &[
                storage_entry(0, true),
                uniform_entry(1, wgpu::ShaderStages::VERTEX),
            ],
        });

        let compute_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("portal_compute_pl"),
            bind_group_layouts: &[&compute_bgl],
            push_constant_ranges: &[],
        });
        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("portal_compute_pipeline"),
            layout: Some(&compute_pl),
            module: &compute_shader,
            entry_point: Some("cs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let render_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("portal_render_pl"),
            bind_group_layouts: &[&render_bgl],
            push_constant_ranges: &[],
        });
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("portal_render_pipeline"),
            layout: Some(&render_pl),
            vertex: wgpu::VertexState {
                module: &draw_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &draw_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("portal_compute_bg"),
            layout: &compute_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: velocity_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });
        let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("portal_render_bg"),
            layout: &render_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!("compute backend online: {particle_count} particles");
        Ok(Self {
            surface,
            device,
            queue,
            config,
            compute_pipeline,
            render_pipeline,
            compute_bind_group,
            render_bind_group,
            position_buffer,
            velocity_buffer,
            params_buffer,
            particle_count,
            width,
            height,
        })
    }

    fn to_ndc(&self, point: Vec2) -> [f32; 2] {
        let cx = (point.x / self.width.max(1) as f32) * 2.0 - 1.0;
        let cy = -((point.y / self.height.max(1) as f32) * 2.0 - 1.0);
        [cx, cy]
    }
}

impl SimulationBackend for ComputePortal {
    fn kind(&self) -> BackendKind {
        BackendKind::Compute
    }

    fn particle_count(&self) -> u32 {
        self.particle_count
    }

    /// Stages the per-frame parameter block. The tilt offset is folded into
    /// the steer point before the NDC mapping, so the kernel sees the same
    /// target the software path does.
    fn step(&mut self, drivers: &FieldDrivers) {
        let params = FrameParams {
            target: self.to_ndc(drivers.steer_point()),
            dt: drivers.dt,
            energy: drivers.energy,
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Compute pass first, then the draw pass reading the just-updated
    /// position buffer — one encoder, so the ordering holds within the frame.
    fn render(&mut self, _time: f32, _energy: f32) {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                log::error!("surface error: {e:?}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("portal_encoder"),
            });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("portal_update"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.compute_pipeline);
            cpass.set_bind_group(0, &self.compute_bind_group, &[]);
            cpass.dispatch_workgroups(self.particle_count.div_ceil(COMPUTE_WORKGROUP_SIZE), 1, 1);
        }
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("portal_draw"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.render_pipeline);
            rpass.set_bind_group(0, &self.render_bind_group, &[]);
            rpass.draw(0..6, 0..self.particle_count);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }

    /// Only the output surface changes; particle buffers stay as they are.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }
}
