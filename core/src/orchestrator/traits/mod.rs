pub mod handler;
pub mod renderer;
pub mod sink;
pub mod strategy;

pub use handler::*;
pub use renderer::*;
pub use sink::*;
pub use strategy::*;
