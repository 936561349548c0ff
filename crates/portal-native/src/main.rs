//! Desktop runner: the compute backend on a winit window, cursor steering,
//! and microphone energy from a cpal input stream.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use portal_core::constants::*;
use portal_core::{
    particle_count_for_area, BackendKind, FieldDrivers, FrameScheduler, InputAggregator,
    PortalController, PortalError, SimulationBackend,
};
use rand::Rng;
use winit::{event::*, event_loop::EventLoop, window::WindowBuilder};

mod audio;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameParams {
    target: [f32; 2],
    dt: f32,
    energy: f32,
}

struct GpuPortal {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    compute_pipeline: wgpu::ComputePipeline,
    render_pipeline: wgpu::RenderPipeline,
    compute_bind_group: wgpu::BindGroup,
    render_bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    particle_count: u32,
    width: u32,
    height: u32,
}

impl GpuPortal {
    async fn new(window: Arc<winit::window::Window>) -> Result<Self, PortalError> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
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
        let format = caps.formats[0];
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

        let buffer_entry = |binding, visibility, ty| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let compute_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("portal_compute_bgl"),
            entries: &[
                buffer_entry(
                    0,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu::BufferBindingType::Storage { read_only: false },
                ),
                buffer_entry(
                    1,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu::BufferBindingType::Storage { read_only: false },
                ),
                buffer_entry(
                    2,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu::BufferBindingType::Uniform,
                ),
            ],
        });
        let render_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("portal_render_bgl"),
            entries: &[
                buffer_entry(
                    0,
                    wgpu::ShaderStages::VERTEX,
                    wgpu::BufferBindingType::Storage { read_only: true },
                ),
                buffer_entry(1, wgpu::ShaderStages::VERTEX, wgpu::BufferBindingType::Uniform),
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
            params_buffer,
            particle_count,
            width,
            height,
        })
    }
}

impl SimulationBackend for GpuPortal {
    fn kind(&self) -> BackendKind {
        BackendKind::Compute
    }

    fn particle_count(&self) -> u32 {
        self.particle_count
    }

    fn step(&mut self, drivers: &FieldDrivers) {
        let steer = drivers.steer_point();
        let params = FrameParams {
            target: [
                (steer.x / self.width.max(1) as f32) * 2.0 - 1.0,
                -((steer.y / self.height.max(1) as f32) * 2.0 - 1.0),
            ],
            dt: drivers.dt,
            energy: drivers.energy,
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

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
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.01,
                            g: 0.005,
                            b: 0.03,
                            a: 1.0,
                        }),
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

/// Frame scheduling through winit redraw requests. A redraw cannot be
/// recalled once requested, but the controller ignores frames outside the
/// running state, so cancel only needs to stop requesting new ones.
struct RedrawScheduler {
    window: Arc<winit::window::Window>,
}

impl FrameScheduler for RedrawScheduler {
    fn schedule_frame(&mut self) {
        self.window.request_redraw();
    }

    fn cancel_frame(&mut self) {}
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Particle Portal (native)")
            .build(&event_loop)?,
    );

    let size = window.inner_size();
    let inputs = Rc::new(RefCell::new(InputAggregator::new(
        size.width as f32,
        size.height as f32,
    )));
    let energy = audio::init_energy_source();

    // The desktop runner has no canvas fallback; without a GPU adapter there
    // is nothing to draw into, so the probe failure ends the process here.
    let backend = pollster::block_on(GpuPortal::new(window.clone()))
        .map(|g| Box::new(g) as Box<dyn SimulationBackend>)
        .map_err(|e| anyhow::anyhow!("no compute backend: {e}"))?;

    let mut controller = PortalController::new(
        Ok(backend),
        || -> Box<dyn SimulationBackend> { unreachable!("probe outcome already checked") },
        inputs.clone(),
        energy,
        RedrawScheduler {
            window: window.clone(),
        },
    );
    controller.start();

    let mut last_frame = Instant::now();
    event_loop.run(move |event, elwt| {
        if let Event::WindowEvent { event, .. } = event {
            match event {
                WindowEvent::Resized(size) => controller.resize(size.width, size.height),
                WindowEvent::CursorMoved { position, .. } => inputs
                    .borrow_mut()
                    .record_pointer(position.x as f32, position.y as f32),
                WindowEvent::CloseRequested => {
                    controller.teardown();
                    elwt.exit();
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f32();
                    last_frame = now;
                    controller.frame(dt);
                }
                _ => {}
            }
        }
    })?;
    Ok(())
}
