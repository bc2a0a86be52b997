//! shadefilter runtime (glow/OpenGL ES 2 backend)
//
// This crate intentionally contains **only** the GL side of the filter:
// - compile/link shader programs and set uniforms by name
// - upload source frames into a texture
// - manage the off-screen target (FBO + colour renderbuffer) and read it back
// - open a headless EGL context for hosts that have no window system
//
// The frame algorithm itself (lazy init, program swaps, parameter binding) lives in
// `shadefilter-runtime`.
#![allow(clippy::missing_safety_doc)]

mod device;
mod egl;
pub mod program;
pub mod quad;
pub mod target;
pub mod texture;

pub use device::GlowDevice;
pub use egl::HeadlessEglProvider;
pub use program::{compile_program, ShaderProgram};
pub use quad::FullscreenQuad;
pub use target::{create_render_target, RenderTarget};
pub use texture::SourceTexture;

pub use shadefilter_core::FilterError;
pub use shadefilter_runtime::FilterGpu;

/// A filter rendering through a headless EGL context.
pub type GlFilter = FilterGpu<HeadlessEglProvider>;

/// Creates a filter that opens its own EGL context on the first `process()` call.
pub fn headless_filter(instance: impl Into<String>) -> GlFilter {
    FilterGpu::new(instance, HeadlessEglProvider::new())
}
