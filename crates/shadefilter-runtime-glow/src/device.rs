use std::fmt;

use glow::HasContext;

use shadefilter_core::{DestImage, FilterError, ParamValue, RenderTargetDesc, ShaderSource, SourceFormat, SourceImage};
use shadefilter_runtime::{Device, QuadAttributes};

use crate::egl::EglContext;
use crate::program::ShaderProgram;
use crate::quad::FullscreenQuad;
use crate::target::{create_render_target, RenderTarget};
use crate::texture::SourceTexture;

/// [`Device`] over a glow context that is current on the calling thread.
///
/// When the device owns its EGL context (see [`HeadlessEglProvider`](crate::HeadlessEglProvider)),
/// dropping it releases surface, context and display after the GL function table.
pub struct GlowDevice {
    gl: glow::Context,
    egl: Option<EglContext>,
}

impl GlowDevice {
    /// Wraps a host-managed context.
    ///
    /// # Safety
    /// The context behind `gl` must be a GLES 2 compatible context, current on this thread for
    /// the whole lifetime of the device.
    pub unsafe fn from_current(gl: glow::Context) -> Self {
        Self { gl, egl: None }
    }

    /// # Safety
    /// `gl` must have been loaded from `egl`, and `egl` must be current on this thread.
    pub(crate) unsafe fn with_egl(gl: glow::Context, egl: EglContext) -> Self {
        Self { gl, egl: Some(egl) }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

impl fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDevice")
            .field("version", self.gl.version())
            .field("owns_context", &self.egl.is_some())
            .finish()
    }
}

// SAFETY (all blocks below): the constructors require the context to be current on this thread,
// and the pipeline only calls a device from the thread that opened it.
impl Device for GlowDevice {
    type Texture = SourceTexture;
    type Program = ShaderProgram;
    type Target = RenderTarget;
    type Quad = FullscreenQuad;

    fn create_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTarget, FilterError> {
        let target = unsafe { create_render_target(&self.gl, desc)? };
        tracing::debug!(width = desc.width, height = desc.height, kind = %desc.kind, "render target allocated");
        Ok(target)
    }

    fn delete_target(&mut self, target: RenderTarget) {
        unsafe { target.destroy(&self.gl) }
    }

    fn create_quad(&mut self) -> Result<FullscreenQuad, FilterError> {
        unsafe { FullscreenQuad::new(&self.gl) }
    }

    fn delete_quad(&mut self, quad: FullscreenQuad) {
        unsafe { quad.destroy(&self.gl) }
    }

    fn create_texture(&mut self, format: &SourceFormat) -> Result<SourceTexture, FilterError> {
        unsafe { SourceTexture::create(&self.gl, format) }
    }

    fn update_texture(&mut self, texture: &SourceTexture, src: &SourceImage<'_>) -> Result<(), FilterError> {
        unsafe { texture.update(&self.gl, src) }
    }

    fn bind_texture(&mut self, texture: &SourceTexture, unit: u32) {
        unsafe { texture.bind(&self.gl, unit) }
    }

    fn delete_texture(&mut self, texture: SourceTexture) {
        unsafe { texture.destroy(&self.gl) }
    }

    fn compile_program(&mut self, source: &ShaderSource) -> Result<ShaderProgram, FilterError> {
        unsafe { ShaderProgram::new(&self.gl, source) }
    }

    fn use_program(&mut self, program: &ShaderProgram) {
        unsafe { program.activate(&self.gl) }
    }

    fn set_uniform(&mut self, program: &ShaderProgram, name: &str, value: ParamValue) -> bool {
        unsafe { program.set_uniform(&self.gl, name, value) }
    }

    fn attribute_location(&self, program: &ShaderProgram, name: &str) -> Option<u32> {
        unsafe { program.attribute_location(&self.gl, name) }
    }

    fn delete_program(&mut self, program: ShaderProgram) {
        unsafe { program.destroy(&self.gl) }
    }

    fn draw_quad(&mut self, target: &RenderTarget, quad: &FullscreenQuad, attrs: QuadAttributes) {
        let gl = &self.gl;
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(target.fbo));
            gl.viewport(0, 0, target.desc.width as i32, target.desc.height as i32);
            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            quad.draw(gl, attrs);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn read_pixels(&mut self, target: &RenderTarget, dst: &mut DestImage<'_>) -> Result<(), FilterError> {
        unsafe { target.read_into(&self.gl, dst) }
    }
}
