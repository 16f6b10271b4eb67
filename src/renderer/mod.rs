//! Rendering module
//!
//! The game state is turned into a `Frame` of draw commands; geometric
//! commands are tessellated and drawn with WebGPU, glyphs and labels are left
//! to the host's DOM overlay.

pub mod frame;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use frame::{DrawCmd, Frame, build_frame};
pub use pipeline::RenderState;
pub use vertex::Vertex;
