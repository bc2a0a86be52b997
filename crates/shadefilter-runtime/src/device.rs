use shadefilter_core::{DestImage, FilterError, ParamValue, RenderTargetDesc, ShaderSource, SourceFormat, SourceImage};

/// Attribute locations the full-frame quad feeds, as reported by the active program.
///
/// `None` means the program does not use that attribute; the backend leaves it disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadAttributes {
    pub position: Option<u32>,
    pub texcoord: Option<u32>,
}

/// The GPU operations the filter pipeline needs from a backend.
///
/// A `Device` is only ever used from the thread that opened it. Handle types are plain values
/// owned by the caller; every `create_*` is paired with exactly one `delete_*`.
pub trait Device {
    type Texture;
    type Program;
    type Target;
    type Quad;

    // ---- Off-screen target (framebuffer + colour renderbuffer) ----
    fn create_target(&mut self, desc: &RenderTargetDesc) -> Result<Self::Target, FilterError>;
    fn delete_target(&mut self, target: Self::Target);

    // ---- Full-frame quad vertex buffer ----
    fn create_quad(&mut self) -> Result<Self::Quad, FilterError>;
    fn delete_quad(&mut self, quad: Self::Quad);

    // ---- Texture collaborator ----
    fn create_texture(&mut self, format: &SourceFormat) -> Result<Self::Texture, FilterError>;
    fn update_texture(&mut self, texture: &Self::Texture, src: &SourceImage<'_>) -> Result<(), FilterError>;
    fn bind_texture(&mut self, texture: &Self::Texture, unit: u32);
    fn delete_texture(&mut self, texture: Self::Texture);

    // ---- ShaderProgram collaborator ----
    fn compile_program(&mut self, source: &ShaderSource) -> Result<Self::Program, FilterError>;
    fn use_program(&mut self, program: &Self::Program);
    /// Sets a uniform by name. Returns false when the program has no active uniform `name`.
    fn set_uniform(&mut self, program: &Self::Program, name: &str, value: ParamValue) -> bool;
    fn attribute_location(&self, program: &Self::Program, name: &str) -> Option<u32>;
    fn delete_program(&mut self, program: Self::Program);

    // ---- Draw + readback ----
    /// Draws the quad into `target` with the program currently in use.
    fn draw_quad(&mut self, target: &Self::Target, quad: &Self::Quad, attrs: QuadAttributes);
    /// Blocks until rendering finishes, then reads `target` straight into `dst`.
    ///
    /// Must not write `dst` when it returns an error.
    fn read_pixels(&mut self, target: &Self::Target, dst: &mut DestImage<'_>) -> Result<(), FilterError>;
}

/// Creates a [`Device`] on the calling thread.
///
/// The pipeline calls `open` lazily, from inside the first `process()`, so the context ends up
/// current on the render thread rather than on whichever thread constructed the filter.
pub trait DeviceProvider: Send {
    type Device: Device;

    fn open(&mut self) -> Result<Self::Device, FilterError>;
}
