use glow::HasContext;

use shadefilter_core::FilterError;
use shadefilter_runtime::QuadAttributes;

/// Interleaved `x, y, u, v` for a 4-vertex strip (two triangles) covering the viewport.
/// `v = 0` sits at the bottom edge, which is also where readback row 0 comes from.
const QUAD_VERTS: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];

const STRIDE: i32 = 4 * core::mem::size_of::<f32>() as i32;

/// The fixed vertex buffer for the full-frame quad, created once and reused by every draw.
#[derive(Debug)]
pub struct FullscreenQuad {
    vbo: glow::NativeBuffer,
}

impl FullscreenQuad {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, FilterError> {
        let vbo = gl
            .create_buffer()
            .map_err(|e| FilterError::GlCreate(format!("create_buffer: {e}")))?;

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD_VERTS),
            glow::STATIC_DRAW,
        );
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok(Self { vbo })
    }

    /// Draws with whichever attributes the active program exposes.
    pub unsafe fn draw(&self, gl: &glow::Context, attrs: QuadAttributes) {
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        if let Some(loc) = attrs.position {
            gl.enable_vertex_attrib_array(loc);
            gl.vertex_attrib_pointer_f32(loc, 2, glow::FLOAT, false, STRIDE, 0);
        }
        if let Some(loc) = attrs.texcoord {
            gl.enable_vertex_attrib_array(loc);
            gl.vertex_attrib_pointer_f32(loc, 2, glow::FLOAT, false, STRIDE, 2 * 4);
        }

        gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);

        for loc in [attrs.position, attrs.texcoord].into_iter().flatten() {
            gl.disable_vertex_attrib_array(loc);
        }
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
    }

    pub unsafe fn destroy(self, gl: &glow::Context) {
        gl.delete_buffer(self.vbo);
    }
}
