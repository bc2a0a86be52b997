//! Builtin GLSL ES 1.00 filters.
//!
//! Shader conventions shared by every program the filter runs:
//! - attribute `vertex`: clip-space position of the full-frame quad
//! - attribute `texcoord`: texture coordinate in [0, 1]
//! - varying `tcoord`: interpolated texture coordinate
//! - uniform `tex`: the uploaded source frame (unit 0)
//! - uniform `texelsize`: size of one source pixel in texture space

use std::str::FromStr;

use crate::{ParamValue, ShaderSource};

pub const SAMPLER_UNIFORM: &str = "tex";
pub const TEXEL_SIZE_UNIFORM: &str = "texelsize";
pub const POSITION_ATTRIBUTE: &str = "vertex";
pub const TEXCOORD_ATTRIBUTE: &str = "texcoord";

pub const PASSTHROUGH_VERT: &str = r#"attribute vec2 vertex;
attribute vec2 texcoord;
varying vec2 tcoord;
void main() {
    tcoord = texcoord;
    gl_Position = vec4(vertex, 0.0, 1.0);
}
"#;

pub const PASSTHROUGH_FRAG: &str = r#"precision mediump float;
varying vec2 tcoord;
uniform sampler2D tex;
void main() {
    gl_FragColor = texture2D(tex, tcoord);
}
"#;

pub const INVERT_FRAG: &str = r#"precision mediump float;
varying vec2 tcoord;
uniform sampler2D tex;
void main() {
    vec4 c = texture2D(tex, tcoord);
    gl_FragColor = vec4(1.0 - c.rgb, c.a);
}
"#;

pub const THRESHOLD_FRAG: &str = r#"precision mediump float;
varying vec2 tcoord;
uniform sampler2D tex;
uniform float threshold;
void main() {
    vec4 c = texture2D(tex, tcoord);
    float lum = dot(c.rgb, vec3(0.299, 0.587, 0.114));
    gl_FragColor = vec4(vec3(step(threshold, lum)), 1.0);
}
"#;

pub const SOBEL_FRAG: &str = r#"precision mediump float;
varying vec2 tcoord;
uniform sampler2D tex;
uniform vec2 texelsize;
float lum(vec2 o) {
    return dot(texture2D(tex, tcoord + o * texelsize).rgb, vec3(0.299, 0.587, 0.114));
}
void main() {
    float tl = lum(vec2(-1.0, -1.0));
    float t  = lum(vec2( 0.0, -1.0));
    float tr = lum(vec2( 1.0, -1.0));
    float l  = lum(vec2(-1.0,  0.0));
    float r  = lum(vec2( 1.0,  0.0));
    float bl = lum(vec2(-1.0,  1.0));
    float b  = lum(vec2( 0.0,  1.0));
    float br = lum(vec2( 1.0,  1.0));
    float gx = (tr + 2.0 * r + br) - (tl + 2.0 * l + bl);
    float gy = (bl + 2.0 * b + br) - (tl + 2.0 * t + tr);
    float g = clamp(length(vec2(gx, gy)), 0.0, 1.0);
    gl_FragColor = vec4(g, g, g, 1.0);
}
"#;

pub const TWIRL_FRAG: &str = r#"precision mediump float;
varying vec2 tcoord;
uniform sampler2D tex;
uniform vec2 center;
uniform float radius;
uniform float angle;
void main() {
    vec2 d = tcoord - center;
    float dist = length(d);
    if (dist < radius) {
        float pct = (radius - dist) / radius;
        float theta = pct * pct * angle;
        float s = sin(theta);
        float c = cos(theta);
        d = vec2(d.x * c - d.y * s, d.x * s + d.y * c);
    }
    gl_FragColor = texture2D(tex, center + d);
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinShader {
    Passthrough,
    Invert,
    Threshold,
    Sobel,
    Twirl,
}

impl BuiltinShader {
    pub const ALL: [BuiltinShader; 5] = [
        BuiltinShader::Passthrough,
        BuiltinShader::Invert,
        BuiltinShader::Threshold,
        BuiltinShader::Sobel,
        BuiltinShader::Twirl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinShader::Passthrough => "passthrough",
            BuiltinShader::Invert => "invert",
            BuiltinShader::Threshold => "threshold",
            BuiltinShader::Sobel => "sobel",
            BuiltinShader::Twirl => "twirl",
        }
    }

    pub fn frag(self) -> &'static str {
        match self {
            BuiltinShader::Passthrough => PASSTHROUGH_FRAG,
            BuiltinShader::Invert => INVERT_FRAG,
            BuiltinShader::Threshold => THRESHOLD_FRAG,
            BuiltinShader::Sobel => SOBEL_FRAG,
            BuiltinShader::Twirl => TWIRL_FRAG,
        }
    }

    /// Every builtin uses the passthrough vertex stage.
    pub fn vert(self) -> &'static str {
        PASSTHROUGH_VERT
    }

    pub fn source(self) -> ShaderSource {
        ShaderSource::new(self.vert(), self.frag()).with_origin(format!("builtin:{}", self.name()))
    }

    /// Parameters that give a sensible result without further tuning.
    pub fn default_params(self) -> Vec<(&'static str, ParamValue)> {
        match self {
            BuiltinShader::Threshold => vec![("threshold", ParamValue::F1(0.5))],
            BuiltinShader::Twirl => vec![
                ("center", ParamValue::F2([0.5, 0.5])),
                ("radius", ParamValue::F1(0.5)),
                ("angle", ParamValue::F1(3.0)),
            ],
            _ => Vec::new(),
        }
    }
}

impl FromStr for BuiltinShader {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuiltinShader::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| format!("unknown builtin shader '{s}'"))
    }
}
