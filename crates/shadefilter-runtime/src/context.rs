use std::fmt;

use shadefilter_core::{FilterError, RenderTargetDesc};

use crate::device::{Device, DeviceProvider};

/// Owns the opened device plus the objects every frame needs: the off-screen target sized to the
/// destination image and the full-frame quad.
///
/// Release order on drop is the reverse of acquisition: quad, target, then the device itself
/// (which closes its surface, context and display).
pub struct ContextManager<D: Device> {
    target: Option<(RenderTargetDesc, D::Target)>,
    quad: Option<D::Quad>,
    device: Option<D>,
}

impl<D: Device> ContextManager<D> {
    /// Opens the device and allocates a target for `desc` and the quad.
    ///
    /// Every failure is reported as `ContextInit`; nothing acquired so far is kept.
    pub fn open<P>(provider: &mut P, desc: RenderTargetDesc) -> Result<Self, FilterError>
    where
        P: DeviceProvider<Device = D>,
    {
        let device = provider.open().map_err(into_context_error)?;
        let mut ctx = Self {
            target: None,
            quad: None,
            device: Some(device),
        };
        ctx.ensure_target(desc)?;
        let quad = ctx.device_mut()?.create_quad().map_err(into_context_error)?;
        ctx.quad = Some(quad);
        tracing::debug!(width = desc.width, height = desc.height, kind = %desc.kind, "gpu context ready");
        Ok(ctx)
    }

    /// Reallocates the target when the destination size or pixel kind changed.
    ///
    /// The old target is released before the new one is created. Failure is `ContextInit`.
    pub fn ensure_target(&mut self, desc: RenderTargetDesc) -> Result<(), FilterError> {
        if matches!(&self.target, Some((cur, _)) if *cur == desc) {
            return Ok(());
        }
        if let Some((old, target)) = self.target.take() {
            tracing::debug!(
                from = ?(old.width, old.height, old.kind),
                to = ?(desc.width, desc.height, desc.kind),
                "resizing render target"
            );
            self.device_mut()?.delete_target(target);
        }
        let target = self.device_mut()?.create_target(&desc).map_err(into_context_error)?;
        self.target = Some((desc, target));
        Ok(())
    }

    pub fn desc(&self) -> Option<RenderTargetDesc> {
        self.target.as_ref().map(|(d, _)| *d)
    }

    pub fn device_mut(&mut self) -> Result<&mut D, FilterError> {
        self.device.as_mut().ok_or(FilterError::ContextUnusable)
    }

    /// Splits into the device and the per-frame objects for drawing.
    pub fn parts(&mut self) -> Result<(&mut D, &D::Target, &D::Quad), FilterError> {
        match (&mut self.device, &self.target, &self.quad) {
            (Some(device), Some((_, target)), Some(quad)) => Ok((device, target, quad)),
            _ => Err(FilterError::ContextUnusable),
        }
    }
}

impl<D: Device> fmt::Debug for ContextManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextManager")
            .field("target", &self.desc())
            .field("has_quad", &self.quad.is_some())
            .field("open", &self.device.is_some())
            .finish()
    }
}

impl<D: Device> Drop for ContextManager<D> {
    fn drop(&mut self) {
        let Some(device) = self.device.as_mut() else {
            return;
        };
        if let Some(quad) = self.quad.take() {
            device.delete_quad(quad);
        }
        if let Some((_, target)) = self.target.take() {
            device.delete_target(target);
        }
        drop(self.device.take());
        tracing::debug!("gpu context released");
    }
}

fn into_context_error(e: FilterError) -> FilterError {
    match e {
        FilterError::ContextInit(_) => e,
        other => FilterError::ContextInit(other.to_string()),
    }
}
