//! chatgen ABI crate: contracts shared by inference engines, samplers,
//! chat templates and the orchestration core.

pub mod chat;
pub mod engine;
pub mod params;
pub mod sampling;
pub mod template;
pub mod token;

pub use chat::*;
pub use engine::*;
pub use params::*;
pub use sampling::*;
pub use template::*;
pub use token::*;
