//! Headless EGL context creation (glutin), no window system required.

use std::ffi::CString;
use std::fmt;
use std::num::NonZeroU32;

use glutin::api::egl::config::Config;
use glutin::api::egl::context::PossiblyCurrentContext;
use glutin::api::egl::device::Device as EglDevice;
use glutin::api::egl::display::Display;
use glutin::api::egl::surface::Surface;
use glutin::config::{Api, ConfigSurfaceTypes, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, Version};
use glutin::prelude::*;
use glutin::surface::{PbufferSurface, SurfaceAttributesBuilder};

use shadefilter_core::FilterError;
use shadefilter_runtime::DeviceProvider;

use crate::device::GlowDevice;

/// The context handle set. Fields drop in declaration order, which is the reverse of the order
/// they were acquired in: surface, context, config, display.
pub(crate) struct EglContext {
    _surface: Surface<PbufferSurface>,
    _context: PossiblyCurrentContext,
    _config: Config,
    _display: Display,
}

impl Drop for EglContext {
    fn drop(&mut self) {
        tracing::debug!("releasing egl surface, context and display");
    }
}

/// Opens a GLES 2 context on an EGL device with a 1×1 pbuffer surface bound.
///
/// All rendering happens into framebuffer objects; the pbuffer only exists so the context can be
/// made current.
#[derive(Debug, Clone, Default)]
pub struct HeadlessEglProvider {
    /// Index into the EGL device list; `None` picks the first device.
    pub device_index: Option<usize>,
}

impl HeadlessEglProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_index(index: usize) -> Self {
        Self {
            device_index: Some(index),
        }
    }
}

fn init_err(step: &str, e: impl fmt::Display) -> FilterError {
    FilterError::ContextInit(format!("{step}: {e}"))
}

impl DeviceProvider for HeadlessEglProvider {
    type Device = GlowDevice;

    fn open(&mut self) -> Result<GlowDevice, FilterError> {
        let index = self.device_index.unwrap_or(0);
        let egl_device = EglDevice::query_devices()
            .map_err(|e| init_err("query egl devices", e))?
            .nth(index)
            .ok_or_else(|| FilterError::ContextInit(format!("no egl device at index {index}")))?;

        let display = unsafe { Display::with_device(&egl_device, None) }
            .map_err(|e| init_err("open egl display", e))?;

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(0)
            .with_stencil_size(0)
            .with_surface_type(ConfigSurfaceTypes::PBUFFER)
            .with_api(Api::GLES2)
            .build();
        let config = unsafe { display.find_configs(template) }
            .map_err(|e| init_err("find egl configs", e))?
            .next()
            .ok_or_else(|| FilterError::ContextInit("no colour-only pbuffer config".into()))?;

        let attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
            .build(None);
        let not_current = unsafe { display.create_context(&config, &attrs) }
            .map_err(|e| init_err("create gles context", e))?;

        let surface_attrs =
            SurfaceAttributesBuilder::<PbufferSurface>::new().build(NonZeroU32::MIN, NonZeroU32::MIN);
        let surface = unsafe { display.create_pbuffer_surface(&config, &surface_attrs) }
            .map_err(|e| init_err("create pbuffer surface", e))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|e| init_err("make context current", e))?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| match CString::new(s) {
                Ok(name) => display.get_proc_address(&name) as *const _,
                Err(_) => std::ptr::null(),
            })
        };
        tracing::debug!(
            device = index,
            version = ?glow::HasContext::version(&gl),
            "egl context current on {:?}",
            std::thread::current().id()
        );

        let egl = EglContext {
            _surface: surface,
            _context: context,
            _config: config,
            _display: display,
        };
        // SAFETY: `gl` was just loaded from this display and the context is current here.
        Ok(unsafe { GlowDevice::with_egl(gl, egl) })
    }
}
