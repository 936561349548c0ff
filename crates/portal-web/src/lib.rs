#![cfg(target_arch = "wasm32")]
//! Browser frontend: wires the canvas, input listeners, microphone, and the
//! backend probe into a [`PortalController`] driven by requestAnimationFrame.

use portal_core::{InputAggregator, PortalController};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod canvas2d;
mod compute;
mod dom;
mod events;
mod frame;

const CANVAS_ID: &str = "portal-canvas";
const PARTICLE_SEED: u64 = 42;

thread_local! {
    static PORTAL: RefCell<Option<Rc<RefCell<PortalController<frame::RafScheduler>>>>> =
        const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("portal-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

/// Tears the active portal down: cancels the scheduled frame, releases GPU or
/// canvas resources, and stops microphone capture. Idempotent.
#[wasm_bindgen]
pub fn dispose_portal() {
    PORTAL.with(|slot| {
        if let Some(controller) = slot.borrow_mut().take() {
            controller.borrow_mut().teardown();
        }
    });
}

async fn init() -> anyhow::Result<()> {
    let document =
        dom::window_document().ok_or_else(|| anyhow::anyhow!("no window.document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{CANVAS_ID}"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    dom::sync_canvas_backing_size(&canvas);

    let inputs = Rc::new(RefCell::new(InputAggregator::new(
        canvas.width() as f32,
        canvas.height() as f32,
    )));
    events::wire_input_listeners(inputs.clone());

    // Capability probes run once, before the first frame. Microphone denial
    // and missing WebGPU both degrade silently.
    let energy = audio::init_energy_source().await;
    let probed = compute::ComputePortal::new(&canvas)
        .await
        .map(|p| Box::new(p) as Box<dyn portal_core::SimulationBackend>);

    // A failed probe has already locked the canvas's context mode, so the
    // software path draws into a replacement element.
    let active_canvas = if probed.is_ok() {
        canvas.clone()
    } else {
        dom::fallback_canvas(&canvas)
    };
    let fallback_canvas = active_canvas.clone();
    let controller = Rc::new(RefCell::new(PortalController::new(
        probed,
        move || {
            Box::new(canvas2d::SoftwarePortal::new(&fallback_canvas, PARTICLE_SEED))
                as Box<dyn portal_core::SimulationBackend>
        },
        inputs,
        energy,
        frame::RafScheduler::new(),
    )));

    events::wire_resize(&active_canvas, controller.clone());
    PORTAL.with(|slot| *slot.borrow_mut() = Some(controller.clone()));
    frame::start_loop(controller);
    Ok(())
}
