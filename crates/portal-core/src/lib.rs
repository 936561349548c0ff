pub mod constants;
pub mod controller;
pub mod drivers;
pub mod energy;
pub mod error;
pub mod software;

pub static PORTAL_COMPUTE_WGSL: &str = include_str!("../shaders/portal_compute.wgsl");
pub static PORTAL_DRAW_WGSL: &str = include_str!("../shaders/portal_draw.wgsl");

pub use controller::*;
pub use drivers::*;
pub use energy::*;
pub use error::PortalError;
pub use software::*;
