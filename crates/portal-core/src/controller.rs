//! Frame orchestration: capability-probe fallback, the per-frame loop body,
//! resize forwarding, and teardown.
//!
//! The controller never owns a platform timing primitive; the host loop calls
//! [`PortalController::frame`] and the [`FrameScheduler`] abstraction lets the
//! controller request or cancel the next callback.

use crate::constants::MAX_FRAME_DT;
use crate::drivers::InputAggregator;
use crate::energy::EnergySource;
use crate::error::PortalError;
use std::cell::RefCell;
use std::rc::Rc;

/// Which execution backend ended up selected by the capability probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Software,
    Compute,
}

/// Polymorphic simulation backend. The two variants are chosen once at
/// startup, never per frame.
pub trait SimulationBackend {
    fn kind(&self) -> BackendKind;
    fn particle_count(&self) -> u32;
    fn step(&mut self, drivers: &crate::drivers::FieldDrivers);
    fn render(&mut self, time: f32, energy: f32);
    /// Reconfigures only output-surface pixel dimensions; particle storage
    /// must never be reallocated here.
    fn resize(&mut self, width: u32, height: u32);
}

/// Cooperative per-frame scheduling, decoupled from requestAnimationFrame or
/// winit redraw requests.
pub trait FrameScheduler {
    fn schedule_frame(&mut self);
    fn cancel_frame(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Ready(BackendKind),
    Running,
    TornDown,
}

pub struct PortalController<S: FrameScheduler> {
    backend: Option<Box<dyn SimulationBackend>>,
    inputs: Rc<RefCell<InputAggregator>>,
    energy: Option<Box<dyn EnergySource>>,
    scheduler: S,
    state: ControllerState,
    kind: BackendKind,
    elapsed: f32,
}

impl<S: FrameScheduler> PortalController<S> {
    /// Builds the controller from the one-time capability probe outcome.
    ///
    /// A failed probe is not fatal: the software fallback factory runs once
    /// and the result is never re-evaluated.
    pub fn new(
        probed: Result<Box<dyn SimulationBackend>, PortalError>,
        software_fallback: impl FnOnce() -> Box<dyn SimulationBackend>,
        inputs: Rc<RefCell<InputAggregator>>,
        energy: Box<dyn EnergySource>,
        scheduler: S,
    ) -> Self {
        let backend = match probed {
            Ok(backend) => backend,
            Err(e) => {
                log::warn!("compute backend unavailable, using software simulator: {e}");
                software_fallback()
            }
        };
        let kind = backend.kind();
        log::info!(
            "portal ready: {:?} backend, {} particles",
            kind,
            backend.particle_count()
        );
        Self {
            backend: Some(backend),
            inputs,
            energy: Some(energy),
            scheduler,
            state: ControllerState::Ready(kind),
            kind,
            elapsed: 0.0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    /// Enters the steady frame loop and schedules the first callback.
    pub fn start(&mut self) {
        if let ControllerState::Ready(_) = self.state {
            self.state = ControllerState::Running;
            self.scheduler.schedule_frame();
        }
    }

    /// One step of the loop: snapshot drivers, step the backend, render,
    /// reschedule. A no-op outside `Running`, so no frame executes after
    /// teardown begins.
    pub fn frame(&mut self, dt: f32) {
        if self.state != ControllerState::Running {
            return;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let energy = match self.energy.as_mut() {
            Some(source) => source.energy_level(),
            None => 0.0,
        };
        let drivers = self.inputs.borrow().snapshot(dt, energy);
        self.elapsed += dt;
        if let Some(backend) = self.backend.as_mut() {
            backend.step(&drivers);
            backend.render(self.elapsed, energy);
        }
        self.scheduler.schedule_frame();
    }

    /// Serialized with the frame loop by running on the same control thread;
    /// only surface dimensions change.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.state == ControllerState::TornDown {
            return;
        }
        self.inputs
            .borrow_mut()
            .set_viewport(width as f32, height as f32);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(width, height);
        }
    }

    /// Cancels the scheduled frame, then releases the backend's device
    /// resources and the audio capture handle exactly once.
    pub fn teardown(&mut self) {
        if self.state == ControllerState::TornDown {
            return;
        }
        self.scheduler.cancel_frame();
        self.backend = None;
        self.energy = None;
        self.state = ControllerState::TornDown;
        log::info!("portal torn down");
    }
}

impl<S: FrameScheduler> Drop for PortalController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
