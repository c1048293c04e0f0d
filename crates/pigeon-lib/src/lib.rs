// Pigeon Studio shared library
// Generation request lifecycle, credential gate and site models behind the
// studio's AI creative panels

pub mod models;
pub mod services;
pub mod utils;

pub use models::*;
