use std::sync::{Mutex, MutexGuard, PoisonError};

use shadefilter_core::builtin::{POSITION_ATTRIBUTE, SAMPLER_UNIFORM, TEXCOORD_ATTRIBUTE, TEXEL_SIZE_UNIFORM};
use shadefilter_core::{
    DestImage, ErrorClass, FilterError, FilterPreset, ParamTable, ParamValue, RenderTargetDesc,
    ShaderSource, SourceFormat, SourceImage,
};

use crate::context::ContextManager;
use crate::device::{Device, DeviceProvider, QuadAttributes};
use crate::thread::ThreadBound;

/// Configuration state: cheap, written from any thread.
#[derive(Debug, Default)]
struct ConfigState {
    source: Option<ShaderSource>,
    program_changed: bool,
    params: ParamTable,
}

impl ConfigState {
    fn replace_source(&mut self, source: ShaderSource) {
        self.source = Some(source);
        self.program_changed = true;
        self.params.clear();
    }
}

/// Device state: derived from configuration, materialized lazily on the render thread.
struct DeviceState<D: Device> {
    ctx: ContextManager<D>,
    program: Option<D::Program>,
    texture: Option<(SourceFormat, D::Texture)>,
}

impl<D: Device> DeviceState<D> {
    fn new(ctx: ContextManager<D>) -> Self {
        Self {
            ctx,
            program: None,
            texture: None,
        }
    }

    /// Compiles `source`; on success the previous program is deleted and replaced.
    fn install_program(&mut self, source: &ShaderSource) -> Result<(), FilterError> {
        let device = self.ctx.device_mut()?;
        let program = device.compile_program(source)?;
        if let Some(old) = self.program.replace(program) {
            device.delete_program(old);
        }
        tracing::debug!(origin = source.label(), "shader program installed");
        Ok(())
    }

    /// Upload, bind, draw and read back one frame.
    fn render(
        &mut self,
        src: &SourceImage<'_>,
        dst: &mut DestImage<'_>,
        params: &ParamTable,
    ) -> Result<(), FilterError> {
        let program = self.program.as_ref().ok_or(FilterError::NoProgram)?;
        let (device, target, quad) = self.ctx.parts()?;

        // Upload: recreate on shape change, otherwise update in place.
        let format = src.format();
        let reuse = matches!(&self.texture, Some((f, _)) if *f == format);
        if !reuse {
            if let Some((old, tex)) = self.texture.take() {
                tracing::debug!(from = ?old, to = ?format, "recreating source texture");
                device.delete_texture(tex);
            }
            let tex = device.create_texture(&format)?;
            self.texture = Some((format, tex));
        }
        let Some((_, texture)) = self.texture.as_ref() else {
            return Err(FilterError::ContextUnusable);
        };
        device.update_texture(texture, src)?;

        // Bind program inputs.
        device.use_program(program);
        device.bind_texture(texture, 0);
        device.set_uniform(program, SAMPLER_UNIFORM, ParamValue::I1(0));
        device.set_uniform(program, TEXEL_SIZE_UNIFORM, ParamValue::F2(format.texel_size()));
        for (name, value) in params.iter() {
            if !device.set_uniform(program, name, value) {
                tracing::trace!(name, "no active uniform, parameter skipped");
            }
        }

        let attrs = QuadAttributes {
            position: device.attribute_location(program, POSITION_ATTRIBUTE),
            texcoord: device.attribute_location(program, TEXCOORD_ATTRIBUTE),
        };
        device.draw_quad(target, quad, attrs);
        device.read_pixels(target, dst)
    }
}

impl<D: Device> Drop for DeviceState<D> {
    fn drop(&mut self) {
        // `ctx` drops after this body and releases the target, quad and device.
        let Ok(device) = self.ctx.device_mut() else {
            return;
        };
        if let Some((_, tex)) = self.texture.take() {
            device.delete_texture(tex);
        }
        if let Some(program) = self.program.take() {
            device.delete_program(program);
        }
    }
}

enum DeviceSlot<D: Device> {
    /// No `process()` yet.
    Pending,
    Ready(ThreadBound<DeviceState<D>>),
    /// Context creation failed; the filter must be recreated.
    Failed,
}

struct PipelineState<P: DeviceProvider> {
    config: ConfigState,
    provider: P,
    device: DeviceSlot<P::Device>,
}

/// Opens the context on first use and resizes the target when `desc` changed.
fn acquire<'a, P: DeviceProvider>(
    slot: &'a mut DeviceSlot<P::Device>,
    provider: &mut P,
    desc: RenderTargetDesc,
) -> Result<&'a mut DeviceState<P::Device>, FilterError> {
    if matches!(slot, DeviceSlot::Failed) {
        return Err(FilterError::ContextUnusable);
    }
    if matches!(slot, DeviceSlot::Pending) {
        match ContextManager::open(provider, desc) {
            Ok(ctx) => *slot = DeviceSlot::Ready(ThreadBound::new(DeviceState::new(ctx))),
            Err(e) => {
                *slot = DeviceSlot::Failed;
                return Err(e);
            }
        }
    } else if let DeviceSlot::Ready(bound) = slot {
        let resized = bound.get_mut()?.ctx.ensure_target(desc);
        if let Err(e) = resized {
            *slot = DeviceSlot::Failed;
            return Err(e);
        }
    }
    match slot {
        DeviceSlot::Ready(bound) => bound.get_mut(),
        _ => Err(FilterError::ContextUnusable),
    }
}

impl<P: DeviceProvider> PipelineState<P> {
    fn process(&mut self, src: &SourceImage<'_>, dst: &mut DestImage<'_>) -> Result<(), FilterError> {
        // Format errors abort before any GPU state is created or changed.
        src.validate()?;
        dst.validate()?;

        let PipelineState {
            config,
            provider,
            device,
        } = self;
        let state = acquire(device, provider, dst.desc())?;

        if config.program_changed {
            if let Some(source) = &config.source {
                // Cleared on success only. Until the current source compiles, no frame is drawn,
                // so its parameters never reach the previous program.
                state.install_program(source)?;
                config.program_changed = false;
            }
        }

        state.render(src, dst, &config.params)
    }
}

/// Single-image GPU filter: uploads a frame, runs one vertex/fragment program over it into an
/// off-screen target, and reads the result back into caller memory.
///
/// Configuration calls are cheap bookkeeping and may come from any thread. `process()` must always
/// be called from the same thread; the GPU context is created there on the first call.
pub struct FilterGpu<P: DeviceProvider> {
    instance: String,
    state: Mutex<PipelineState<P>>,
}

impl<P: DeviceProvider> FilterGpu<P> {
    /// Creates the filter. No GPU resources are touched until the first `process()`.
    pub fn new(instance: impl Into<String>, provider: P) -> Self {
        Self {
            instance: instance.into(),
            state: Mutex::new(PipelineState {
                config: ConfigState::default(),
                provider,
                device: DeviceSlot::Pending,
            }),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    fn config_lock(&self) -> MutexGuard<'_, PipelineState<P>> {
        // Configuration writes are plain data; a panic elsewhere does not invalidate them.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the shader pair. Clears every cached parameter; invalid source is reported by the
    /// next `process()`.
    pub fn set_program(&self, vertex: impl Into<String>, fragment: impl Into<String>) {
        self.set_source(ShaderSource::new(vertex, fragment));
    }

    pub fn set_source(&self, source: ShaderSource) {
        tracing::debug!(instance = %self.instance, origin = source.label(), "shader source replaced, parameters cleared");
        self.config_lock().config.replace_source(source);
    }

    pub fn set_param(&self, name: impl Into<String>, value: ParamValue) {
        self.config_lock().config.params.set(name, value);
    }

    pub fn set_param_2f(&self, name: impl Into<String>, v1: f32, v2: f32) {
        self.set_param(name, ParamValue::F2([v1, v2]));
    }

    pub fn set_param_1f(&self, name: impl Into<String>, v: f32) {
        self.set_param(name, ParamValue::F1(v));
    }

    pub fn set_param_2i(&self, name: impl Into<String>, v1: i32, v2: i32) {
        self.set_param(name, ParamValue::I2([v1, v2]));
    }

    pub fn set_param_1i(&self, name: impl Into<String>, v: i32) {
        self.set_param(name, ParamValue::I1(v));
    }

    /// Installs a preset's source and parameters under one lock.
    pub fn apply_preset(&self, preset: &FilterPreset) -> Result<(), FilterError> {
        let (source, params) = preset.resolve()?;
        tracing::debug!(instance = %self.instance, origin = source.label(), params = params.len(), "applying preset");
        let mut state = self.config_lock();
        state.config.replace_source(source);
        for (name, value) in params {
            state.config.params.set(name, value);
        }
        Ok(())
    }

    /// Filters `src` into `dst`. Blocks for the full GPU round trip.
    ///
    /// `dst` is left untouched by every failure before readback. Context errors are sticky:
    /// once one is returned, later calls return `ContextUnusable`.
    pub fn process(&self, src: &SourceImage<'_>, dst: &mut DestImage<'_>) -> Result<(), FilterError> {
        let span = tracing::debug_span!("process", instance = %self.instance);
        let _enter = span.enter();

        let mut state = self.state.lock().map_err(|_| FilterError::ContextUnusable)?;
        let result = state.process(src, dst);
        if let Err(e) = &result {
            match e.class() {
                ErrorClass::Context if e.is_fatal() => tracing::error!(error = %e, "gpu filter unusable"),
                _ => tracing::warn!(error = %e, "frame not filtered"),
            }
        }
        result
    }
}

impl<P: DeviceProvider> std::fmt::Debug for FilterGpu<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterGpu")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}
