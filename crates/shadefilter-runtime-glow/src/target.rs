use glow::HasContext;

use shadefilter_core::{DestImage, FilterError, PixelKind, RenderTargetDesc};

/// Offscreen render target (FBO + colour renderbuffer) matching the destination image.
#[derive(Debug)]
pub struct RenderTarget {
    pub fbo: glow::NativeFramebuffer,
    pub rbo: glow::NativeRenderbuffer,
    pub desc: RenderTargetDesc,
}

/// Renderbuffer storage, readback format and readback type for a destination kind.
fn gl_layout(kind: PixelKind) -> (u32, u32, u32) {
    match kind {
        PixelKind::Rgb565 => (glow::RGB565, glow::RGB, glow::UNSIGNED_SHORT_5_6_5),
        PixelKind::Rgba8 => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
    }
}

pub unsafe fn create_render_target(
    gl: &glow::Context,
    desc: &RenderTargetDesc,
) -> Result<RenderTarget, FilterError> {
    let (storage, _, _) = gl_layout(desc.kind);
    let fbo = gl
        .create_framebuffer()
        .map_err(|e| FilterError::GlCreate(format!("create_framebuffer failed: {e:?}")))?;
    let rbo = match gl.create_renderbuffer() {
        Ok(rbo) => rbo,
        Err(e) => {
            gl.delete_framebuffer(fbo);
            return Err(FilterError::GlCreate(format!("create_renderbuffer failed: {e:?}")));
        }
    };

    gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rbo));
    gl.renderbuffer_storage(
        glow::RENDERBUFFER,
        storage,
        desc.width as i32,
        desc.height as i32,
    );
    gl.bind_renderbuffer(glow::RENDERBUFFER, None);

    gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
    gl.framebuffer_renderbuffer(
        glow::FRAMEBUFFER,
        glow::COLOR_ATTACHMENT0,
        glow::RENDERBUFFER,
        Some(rbo),
    );

    let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    if status != glow::FRAMEBUFFER_COMPLETE {
        gl.delete_framebuffer(fbo);
        gl.delete_renderbuffer(rbo);
        return Err(FilterError::GlCreate(format!(
            "framebuffer incomplete for {}x{} {}: 0x{status:x}",
            desc.width, desc.height, desc.kind
        )));
    }

    Ok(RenderTarget {
        fbo,
        rbo,
        desc: *desc,
    })
}

impl RenderTarget {
    /// Waits for rendering, then reads the whole target straight into `dst`.
    ///
    /// `dst` is only written once the driver has confirmed it can produce the requested layout.
    pub unsafe fn read_into(&self, gl: &glow::Context, dst: &mut DestImage<'_>) -> Result<(), FilterError> {
        if dst.desc() != self.desc {
            return Err(FilterError::BufferSize {
                what: "readback destination",
                expected: self.desc.byte_len(),
                actual: dst.data().len(),
            });
        }
        let (_, format, ty) = gl_layout(self.desc.kind);

        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));

        // RGBA/UNSIGNED_BYTE is always readable; 5-6-5 only when it is the implementation's
        // preferred read layout for a 565 attachment.
        if self.desc.kind == PixelKind::Rgb565 {
            let impl_format = gl.get_parameter_i32(glow::IMPLEMENTATION_COLOR_READ_FORMAT) as u32;
            let impl_type = gl.get_parameter_i32(glow::IMPLEMENTATION_COLOR_READ_TYPE) as u32;
            if (impl_format, impl_type) != (format, ty) {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                return Err(FilterError::ReadFormat(format!(
                    "driver reads 0x{impl_format:x}/0x{impl_type:x}, need RGB/UNSIGNED_SHORT_5_6_5"
                )));
            }
        }

        gl.finish();
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        gl.read_pixels(
            0,
            0,
            self.desc.width as i32,
            self.desc.height as i32,
            format,
            ty,
            glow::PixelPackData::Slice(dst.data_mut()),
        );
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        Ok(())
    }

    pub unsafe fn destroy(self, gl: &glow::Context) {
        gl.delete_framebuffer(self.fbo);
        gl.delete_renderbuffer(self.rbo);
    }
}
