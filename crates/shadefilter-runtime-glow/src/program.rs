use glow::HasContext;

use shadefilter_core::{FilterError, ParamValue, ShaderSource};

unsafe fn compile_stage(
    gl: &glow::Context,
    stage: u32,
    src: &str,
) -> Result<glow::NativeShader, FilterError> {
    let shader = gl
        .create_shader(stage)
        .map_err(|e| FilterError::GlCreate(format!("create_shader(0x{stage:x}) failed: {e:?}")))?;
    gl.shader_source(shader, src);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(if stage == glow::VERTEX_SHADER {
            FilterError::VertexCompile(log)
        } else {
            FilterError::FragmentCompile(log)
        });
    }
    Ok(shader)
}

/// Compiles and links a vertex/fragment pair. Intermediate shader objects are always released.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, FilterError> {
    let vs = compile_stage(gl, glow::VERTEX_SHADER, vert_src)?;
    let fs = match compile_stage(gl, glow::FRAGMENT_SHADER, frag_src) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(e);
        }
    };

    let program = match gl.create_program() {
        Ok(p) => p,
        Err(e) => {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(FilterError::GlCreate(format!("create_program failed: {e:?}")));
        }
    };
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(FilterError::Link(log));
    }

    Ok(program)
}

#[derive(Debug)]
pub struct ShaderProgram {
    pub program: glow::NativeProgram,
}

impl ShaderProgram {
    pub unsafe fn new(gl: &glow::Context, source: &ShaderSource) -> Result<Self, FilterError> {
        let program = compile_program(gl, &source.vert, &source.frag)?;
        Ok(Self { program })
    }

    pub unsafe fn activate(&self, gl: &glow::Context) {
        gl.use_program(Some(self.program));
    }

    /// Sets `name` if the program has it as an active uniform. Returns whether it was found.
    pub unsafe fn set_uniform(&self, gl: &glow::Context, name: &str, value: ParamValue) -> bool {
        let Some(loc) = gl.get_uniform_location(self.program, name) else {
            return false;
        };
        match value {
            ParamValue::F2([a, b]) => gl.uniform_2_f32(Some(&loc), a, b),
            ParamValue::I2([a, b]) => gl.uniform_2_i32(Some(&loc), a, b),
            ParamValue::F1(v) => gl.uniform_1_f32(Some(&loc), v),
            ParamValue::I1(v) => gl.uniform_1_i32(Some(&loc), v),
        }
        true
    }

    pub unsafe fn attribute_location(&self, gl: &glow::Context, name: &str) -> Option<u32> {
        gl.get_attrib_location(self.program, name)
    }

    pub unsafe fn destroy(self, gl: &glow::Context) {
        gl.delete_program(self.program);
    }
}
