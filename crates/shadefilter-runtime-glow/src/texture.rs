use glow::HasContext;

use shadefilter_core::{FilterError, SourceFormat, SourceImage};

/// GL texture holding the latest input frame.
///
/// 1-channel frames live in a `LUMINANCE` texture (shaders see R=G=B=lum, A=1); 4-channel frames
/// in `RGBA`. GLES 2 requires the internal format to equal the upload format.
#[derive(Debug)]
pub struct SourceTexture {
    pub tex: glow::NativeTexture,
    pub format: SourceFormat,
}

fn gl_format(format: &SourceFormat) -> Result<u32, FilterError> {
    match format.channels {
        1 => Ok(glow::LUMINANCE),
        4 => Ok(glow::RGBA),
        n => Err(FilterError::UnsupportedChannels(n)),
    }
}

impl SourceTexture {
    /// Allocates storage for `format` without uploading pixels.
    pub unsafe fn create(gl: &glow::Context, format: &SourceFormat) -> Result<Self, FilterError> {
        let fmt = gl_format(format)?;
        let tex = gl
            .create_texture()
            .map_err(|e| FilterError::GlCreate(format!("create_texture failed: {e:?}")))?;

        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            fmt as i32,
            format.width as i32,
            format.height as i32,
            0,
            fmt,
            glow::UNSIGNED_BYTE,
            None,
        );
        gl.bind_texture(glow::TEXTURE_2D, None);

        Ok(Self {
            tex,
            format: *format,
        })
    }

    /// Uploads `src` in place. `src` must have the shape the texture was created with.
    pub unsafe fn update(&self, gl: &glow::Context, src: &SourceImage<'_>) -> Result<(), FilterError> {
        if src.format() != self.format {
            return Err(FilterError::BufferSize {
                what: "texture upload",
                expected: self.format.byte_len(),
                actual: src.data().len(),
            });
        }
        let fmt = gl_format(&self.format)?;

        // Luminance rows are not 4-byte aligned for odd widths.
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
        gl.tex_sub_image_2d(
            glow::TEXTURE_2D,
            0,
            0,
            0,
            self.format.width as i32,
            self.format.height as i32,
            fmt,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(src.data()),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(())
    }

    pub unsafe fn bind(&self, gl: &glow::Context, unit: u32) {
        gl.active_texture(glow::TEXTURE0 + unit);
        gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
    }

    pub unsafe fn destroy(self, gl: &glow::Context) {
        gl.delete_texture(self.tex);
    }
}
