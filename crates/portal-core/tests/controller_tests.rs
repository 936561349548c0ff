use portal_core::{
    BackendKind, ControllerState, EnergySource, FieldDrivers, FrameScheduler, InputAggregator,
    PortalController, PortalError, SimulationBackend,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Default)]
struct SpyScheduler {
    scheduled: Rc<Cell<u32>>,
    cancelled: Rc<Cell<u32>>,
}

impl FrameScheduler for SpyScheduler {
    fn schedule_frame(&mut self) {
        self.scheduled.set(self.scheduled.get() + 1);
    }
    fn cancel_frame(&mut self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

#[derive(Clone, Default)]
struct BackendSpy {
    steps: Rc<Cell<u32>>,
    renders: Rc<Cell<u32>>,
    resizes: Rc<Cell<(u32, u32)>>,
    last_drivers: Rc<RefCell<Option<FieldDrivers>>>,
}

struct SoftwareSpy(BackendSpy);

impl SimulationBackend for SoftwareSpy {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }
    fn particle_count(&self) -> u32 {
        100
    }
    fn step(&mut self, drivers: &FieldDrivers) {
        self.0.steps.set(self.0.steps.get() + 1);
        *self.0.last_drivers.borrow_mut() = Some(*drivers);
    }
    fn render(&mut self, _time: f32, _energy: f32) {
        self.0.renders.set(self.0.renders.get() + 1);
    }
    fn resize(&mut self, width: u32, height: u32) {
        self.0.resizes.set((width, height));
    }
}

struct ComputeStub;

impl SimulationBackend for ComputeStub {
    fn kind(&self) -> BackendKind {
        BackendKind::Compute
    }
    fn particle_count(&self) -> u32 {
        200_000
    }
    fn step(&mut self, _drivers: &FieldDrivers) {}
    fn render(&mut self, _time: f32, _energy: f32) {}
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Mirrors frontend init: GPU resources are only built once an adapter is
/// found; without one the probe reports failure before any allocation.
fn probe_compute(
    adapter_available: bool,
    build_resources: impl FnOnce() -> Box<dyn SimulationBackend>,
) -> Result<Box<dyn SimulationBackend>, PortalError> {
    if !adapter_available {
        return Err(PortalError::CapabilityUnavailable);
    }
    Ok(build_resources())
}

struct ConstEnergy(f32);

impl EnergySource for ConstEnergy {
    fn energy_level(&mut self) -> f32 {
        self.0
    }
}

fn inputs(width: f32, height: f32) -> Rc<RefCell<InputAggregator>> {
    Rc::new(RefCell::new(InputAggregator::new(width, height)))
}

#[test]
fn failed_probe_falls_back_to_software_with_zero_compute_builds() {
    let compute_builds = Rc::new(Cell::new(0u32));
    let spy = BackendSpy::default();
    let probed = probe_compute(false, {
        let builds = compute_builds.clone();
        move || {
            builds.set(builds.get() + 1);
            Box::new(ComputeStub) as Box<dyn SimulationBackend>
        }
    });
    let mut controller = PortalController::new(
        probed,
        {
            let spy = spy.clone();
            move || Box::new(SoftwareSpy(spy)) as Box<dyn SimulationBackend>
        },
        inputs(800.0, 600.0),
        Box::new(ConstEnergy(0.0)),
        SpyScheduler::default(),
    );
    assert_eq!(controller.backend_kind(), BackendKind::Software);
    assert_eq!(controller.state(), ControllerState::Ready(BackendKind::Software));
    assert_eq!(
        compute_builds.get(),
        0,
        "no GPU resource may be built when the adapter probe fails"
    );

    // The degraded session is fully alive: it starts and frames normally.
    controller.start();
    controller.frame(1.0 / 60.0);
    assert_eq!(spy.steps.get(), 1);
    assert_eq!(spy.renders.get(), 1);
}

#[test]
fn successful_probe_keeps_compute_backend() {
    let compute_builds = Rc::new(Cell::new(0u32));
    let probed = probe_compute(true, {
        let builds = compute_builds.clone();
        move || {
            builds.set(builds.get() + 1);
            Box::new(ComputeStub) as Box<dyn SimulationBackend>
        }
    });
    let controller = PortalController::new(
        probed,
        || -> Box<dyn SimulationBackend> {
            panic!("fallback must not run when the probe succeeds")
        },
        inputs(800.0, 600.0),
        Box::new(ConstEnergy(0.0)),
        SpyScheduler::default(),
    );
    assert_eq!(controller.backend_kind(), BackendKind::Compute);
    assert_eq!(compute_builds.get(), 1);
}

#[test]
fn frame_steps_renders_and_reschedules() {
    let spy = BackendSpy::default();
    let scheduler = SpyScheduler::default();
    let aggregator = inputs(800.0, 600.0);
    aggregator.borrow_mut().record_pointer(123.0, 45.0);
    let mut controller = PortalController::new(
        Err(PortalError::CapabilityUnavailable),
        {
            let spy = spy.clone();
            move || Box::new(SoftwareSpy(spy)) as Box<dyn SimulationBackend>
        },
        aggregator,
        Box::new(ConstEnergy(0.25)),
        scheduler.clone(),
    );

    // Frames before start() are ignored.
    controller.frame(1.0 / 60.0);
    assert_eq!(spy.steps.get(), 0);

    controller.start();
    assert!(controller.is_running());
    assert_eq!(scheduler.scheduled.get(), 1);

    controller.frame(1.0 / 60.0);
    assert_eq!(spy.steps.get(), 1);
    assert_eq!(spy.renders.get(), 1);
    assert_eq!(scheduler.scheduled.get(), 2);

    let drivers = spy.last_drivers.borrow().expect("backend saw a snapshot");
    assert_eq!(drivers.target.x, 123.0);
    assert_eq!(drivers.target.y, 45.0);
    assert_eq!(drivers.energy, 0.25);
}

#[test]
fn teardown_cancels_and_stops_all_future_frames() {
    let spy = BackendSpy::default();
    let scheduler = SpyScheduler::default();
    let mut controller = PortalController::new(
        Err(PortalError::CapabilityUnavailable),
        {
            let spy = spy.clone();
            move || Box::new(SoftwareSpy(spy)) as Box<dyn SimulationBackend>
        },
        inputs(800.0, 600.0),
        Box::new(ConstEnergy(0.0)),
        scheduler.clone(),
    );
    controller.start();
    for _ in 0..3 {
        controller.frame(1.0 / 60.0);
    }
    let scheduled_before = scheduler.scheduled.get();
    let steps_before = spy.steps.get();

    controller.teardown();
    assert_eq!(controller.state(), ControllerState::TornDown);
    assert_eq!(scheduler.cancelled.get(), 1);

    for _ in 0..5 {
        controller.frame(1.0 / 60.0);
    }
    assert_eq!(
        scheduler.scheduled.get(),
        scheduled_before,
        "no frame may be scheduled after teardown"
    );
    assert_eq!(spy.steps.get(), steps_before);

    // Idempotent: a second teardown releases nothing twice.
    controller.teardown();
    assert_eq!(scheduler.cancelled.get(), 1);
}

#[test]
fn resize_reaches_backend_and_default_target() {
    let spy = BackendSpy::default();
    let aggregator = inputs(800.0, 600.0);
    let mut controller = PortalController::new(
        Err(PortalError::CapabilityUnavailable),
        {
            let spy = spy.clone();
            move || Box::new(SoftwareSpy(spy)) as Box<dyn SimulationBackend>
        },
        aggregator.clone(),
        Box::new(ConstEnergy(0.0)),
        SpyScheduler::default(),
    );
    controller.resize(1024, 768);
    assert_eq!(spy.resizes.get(), (1024, 768));
    let snap = aggregator.borrow().snapshot(0.0, 0.0);
    assert_eq!(snap.target.x, 512.0);
    assert_eq!(snap.target.y, 384.0);
}
