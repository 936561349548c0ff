//! Canvas2D software backend: the [`SoftwareParticleSimulator`] stepped on the
//! CPU and drawn with the 2D context. This is the guaranteed fallback when the
//! capability probe fails.

use portal_core::{BackendKind, FieldDrivers, SimulationBackend, SoftwareParticleSimulator};
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct SoftwarePortal {
    sim: SoftwareParticleSimulator,
    ctx: Option<web::CanvasRenderingContext2d>,
    width: f32,
    height: f32,
}

impl SoftwarePortal {
    /// All coordinates are physical backing-store pixels; the context carries
    /// no scale transform, matching how input events are recorded.
    ///
    /// Construction cannot fail: if the 2D context is unavailable the
    /// simulation still steps and rendering is a logged no-op, so the hosting
    /// page never goes down with the portal.
    pub fn new(canvas: &web::HtmlCanvasElement, seed: u64) -> Self {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|obj| obj.dyn_into::<web::CanvasRenderingContext2d>().ok());
        if ctx.is_none() {
            log::error!("2d context unavailable, software backend runs without drawing");
        }
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;
        Self {
            sim: SoftwareParticleSimulator::new(width, height, seed),
            ctx,
            width,
            height,
        }
    }

    fn draw_backdrop(&self, ctx: &web::CanvasRenderingContext2d) {
        let (w, h) = (self.width as f64, self.height as f64);
        let (cx, cy) = (w * 0.5, h * 0.5);
        ctx.clear_rect(0.0, 0.0, w, h);
        if let Ok(grad) = ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, w.max(h) * 0.8) {
            let _ = grad.add_color_stop(0.0, "rgba(20, 10, 40, 0.35)");
            let _ = grad.add_color_stop(1.0, "rgba(5, 2, 15, 0.0)");
            ctx.set_fill_style_canvas_gradient(&grad);
            ctx.fill_rect(0.0, 0.0, w, h);
        }
    }

    fn draw_ring(&self, ctx: &web::CanvasRenderingContext2d, energy: f32) {
        let ring = self.sim.ring(energy);
        ctx.begin_path();
        ctx.set_stroke_style_str(&format!("rgba(139, 92, 246, {})", ring.alpha));
        ctx.set_line_width(ring.stroke_width as f64);
        ctx.set_shadow_color("rgba(139, 92, 246, 0.8)");
        ctx.set_shadow_blur(ring.glow as f64);
        let _ = ctx.arc(
            ring.center.x as f64,
            ring.center.y as f64,
            ring.radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.stroke();
        ctx.set_shadow_blur(0.0);
    }
}

impl SimulationBackend for SoftwarePortal {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn particle_count(&self) -> u32 {
        self.sim.particle_count()
    }

    fn step(&mut self, drivers: &FieldDrivers) {
        self.sim.step(drivers);
    }

    fn render(&mut self, time: f32, energy: f32) {
        let Some(ctx) = self.ctx.clone() else {
            return;
        };
        self.draw_backdrop(&ctx);
        for index in 0..self.sim.particles.len() {
            let sprite = self.sim.sprite(index, time, energy);
            ctx.begin_path();
            ctx.set_fill_style_str(&format!(
                "hsla({}, 90%, {}%, {})",
                sprite.hue, sprite.lightness, sprite.alpha
            ));
            let _ = ctx.arc(
                sprite.position.x as f64,
                sprite.position.y as f64,
                sprite.radius as f64,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.fill();
        }
        self.draw_ring(&ctx, energy);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
        self.sim.resize(self.width, self.height);
    }
}
