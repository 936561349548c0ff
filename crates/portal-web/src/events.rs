//! Window-level listeners feeding the input aggregator. All producers write
//! last-value cells; nothing here touches the frame loop directly.

use crate::dom;
use crate::frame::RafScheduler;
use portal_core::{InputAggregator, PortalController};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

fn add_window_listener<E: JsCast + 'static>(
    event: &str,
    mut handler: impl FnMut(E) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    }) as Box<dyn FnMut(web::Event)>);
    if let Some(window) = web::window() {
        let _ = window
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

/// Pointer, touch, and device-orientation producers. Coordinates are scaled
/// to backing-store pixels so both backends agree on units.
pub fn wire_input_listeners(inputs: Rc<RefCell<InputAggregator>>) {
    {
        let inputs = inputs.clone();
        add_window_listener("mousemove", move |ev: web::MouseEvent| {
            let dpr = dom::pixel_ratio() as f32;
            inputs
                .borrow_mut()
                .record_pointer(ev.client_x() as f32 * dpr, ev.client_y() as f32 * dpr);
        });
    }
    {
        let inputs = inputs.clone();
        add_window_listener("touchmove", move |ev: web::TouchEvent| {
            if let Some(touch) = ev.touches().get(0) {
                let dpr = dom::pixel_ratio() as f32;
                inputs
                    .borrow_mut()
                    .record_touch(touch.client_x() as f32 * dpr, touch.client_y() as f32 * dpr);
            }
        });
    }
    {
        let inputs = inputs.clone();
        add_window_listener("deviceorientation", move |ev: web::DeviceOrientationEvent| {
            // beta/gamma may be absent on desktops; the aggregator keeps the
            // previous tilt in that case.
            inputs.borrow_mut().record_tilt(ev.beta(), ev.gamma());
        });
    }
}

/// Resize handling: resync the backing store, then hand the new surface
/// dimensions to the controller. Runs on the control thread, so it is
/// naturally serialized with the frame loop.
pub fn wire_resize(
    canvas: &web::HtmlCanvasElement,
    controller: Rc<RefCell<PortalController<RafScheduler>>>,
) {
    let canvas = canvas.clone();
    add_window_listener("resize", move |_ev: web::Event| {
        dom::sync_canvas_backing_size(&canvas);
        controller
            .borrow_mut()
            .resize(canvas.width(), canvas.height());
    });
}
