//! requestAnimationFrame plumbing: a [`FrameScheduler`] backed by the browser
//! callback id, and the loop bootstrap that feeds measured `dt` into the
//! controller.

use instant::Instant;
use portal_core::{FrameScheduler, PortalController};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Schedules at most one pending animation frame. The tick closure lives in a
/// shared slot so the closure can be installed after the controller (which
/// owns the scheduler) has been constructed.
pub struct RafScheduler {
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    pending: Rc<Cell<Option<i32>>>,
}

impl RafScheduler {
    pub fn new() -> Self {
        Self {
            tick: Rc::new(RefCell::new(None)),
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn tick_slot(&self) -> Rc<RefCell<Option<Closure<dyn FnMut()>>>> {
        self.tick.clone()
    }

    fn pending_slot(&self) -> Rc<Cell<Option<i32>>> {
        self.pending.clone()
    }
}

impl Default for RafScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for RafScheduler {
    fn schedule_frame(&mut self) {
        if self.pending.get().is_some() {
            return;
        }
        let tick = self.tick.borrow();
        let (Some(w), Some(cb)) = (web::window(), tick.as_ref()) else {
            return;
        };
        if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.pending.set(Some(id));
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.pending.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(id);
            }
        }
    }
}

/// Installs the tick closure and enters the steady loop. Each tick clears the
/// pending id, measures wall-clock `dt`, and hands it to the controller, which
/// reschedules itself while it stays in the running state.
pub fn start_loop(controller: Rc<RefCell<PortalController<RafScheduler>>>) {
    let (tick, pending) = {
        let c = controller.borrow();
        (c.scheduler().tick_slot(), c.scheduler().pending_slot())
    };
    let controller_tick = controller.clone();
    let mut last = Instant::now();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        pending.set(None);
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;
        controller_tick.borrow_mut().frame(dt);
    }) as Box<dyn FnMut()>));
    controller.borrow_mut().start();
}
