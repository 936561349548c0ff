use portal_core::constants::DEVICE_PIXEL_RATIO_CAP;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Device pixel ratio capped so dense displays do not quadruple the fill cost.
#[inline]
pub fn pixel_ratio() -> f64 {
    web::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .clamp(1.0, DEVICE_PIXEL_RATIO_CAP)
}

/// Swaps a fresh canvas into the original's place in the DOM, carrying over
/// id, class, and backing dimensions.
///
/// Needed after a failed compute probe: creating the wgpu surface locks the
/// original canvas's context mode to `webgpu`, so `getContext("2d")` on that
/// element returns null forever. Returns the original if the document cannot
/// produce a replacement.
pub fn fallback_canvas(original: &web::HtmlCanvasElement) -> web::HtmlCanvasElement {
    let fresh = window_document()
        .and_then(|doc| doc.create_element("canvas").ok())
        .and_then(|el| el.dyn_into::<web::HtmlCanvasElement>().ok());
    let Some(fresh) = fresh else {
        return original.clone();
    };
    fresh.set_id(&original.id());
    fresh.set_class_name(&original.class_name());
    fresh.set_width(original.width());
    fresh.set_height(original.height());
    let _ = original.replace_with_with_node_1(&fresh);
    fresh
}

/// Keeps the canvas backing store at CSS size * devicePixelRatio.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    let dpr = pixel_ratio();
    let rect = canvas.get_bounding_client_rect();
    let w_px = (rect.width() * dpr) as u32;
    let h_px = (rect.height() * dpr) as u32;
    canvas.set_width(w_px.max(1));
    canvas.set_height(h_px.max(1));
}
