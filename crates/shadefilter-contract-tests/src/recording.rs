//! A `Device` test double that records what the pipeline asks of the GPU.
//!
//! - counts live and created targets, textures, programs and quads
//! - logs every uniform write that hit a declared uniform, per program
//! - "compiles" GLSL by checking for `main` and scanning `uniform`/`attribute` declarations
//! - rasterizes the builtin passthrough and invert shaders on the CPU (nearest sampling)

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use shadefilter_core::builtin::{INVERT_FRAG, PASSTHROUGH_FRAG};
use shadefilter_core::image::pack_rgb565;
use shadefilter_core::{
    DestImage, FilterError, ParamValue, PixelKind, RenderTargetDesc, ShaderSource, SourceFormat,
    SourceImage,
};
use shadefilter_runtime::{Device, DeviceProvider, QuadAttributes};

/// Byte every channel of an unrecognised shader renders to.
pub const OPAQUE_FILL: u8 = 0x80;

#[derive(Debug, Clone, PartialEq)]
pub struct UniformWrite {
    pub program: u32,
    pub name: String,
    pub value: ParamValue,
}

#[derive(Debug, Default)]
pub struct Stats {
    pub opens: usize,
    pub device_dropped: bool,
    pub render_thread: Option<ThreadId>,

    pub targets_created: usize,
    pub live_targets: usize,
    pub last_target: Option<RenderTargetDesc>,

    pub textures_created: usize,
    pub live_textures: usize,
    pub texture_updates: usize,

    /// Program ids in compile order (successful compiles only).
    pub programs: Vec<u32>,
    pub compile_failures: usize,
    pub live_programs: usize,

    pub live_quads: usize,

    pub uniform_writes: Vec<UniformWrite>,
    pub skipped_uniforms: Vec<String>,
    pub draws: usize,
    pub readbacks: usize,
}

impl Stats {
    /// Values written to `name` on `program`, in order.
    pub fn writes_to(&self, program: u32, name: &str) -> Vec<ParamValue> {
        self.uniform_writes
            .iter()
            .filter(|w| w.program == program && w.name == name)
            .map(|w| w.value)
            .collect()
    }

    pub fn live_objects(&self) -> usize {
        self.live_targets + self.live_textures + self.live_programs + self.live_quads
    }
}

pub type SharedStats = Arc<Mutex<Stats>>;

#[derive(Debug, Clone, Default)]
pub struct RecordingProvider {
    pub stats: SharedStats,
    /// When set, `open` fails with this message.
    pub fail_open: Option<String>,
    /// Targets with more pixels than this fail to allocate.
    pub max_target_pixels: Option<u32>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> MutexGuard<'_, Stats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeviceProvider for RecordingProvider {
    type Device = RecordingDevice;

    fn open(&mut self) -> Result<RecordingDevice, FilterError> {
        let mut stats = self.stats();
        stats.opens += 1;
        stats.render_thread = Some(thread::current().id());
        drop(stats);

        if let Some(msg) = &self.fail_open {
            return Err(FilterError::ContextInit(msg.clone()));
        }
        Ok(RecordingDevice {
            stats: self.stats.clone(),
            max_target_pixels: self.max_target_pixels,
            next_id: 1,
            textures: HashMap::new(),
            bound_texture: None,
            current_program: None,
            framebuffers: HashMap::new(),
        })
    }
}

#[derive(Debug)]
pub struct MockTexture {
    id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Raster {
    Passthrough,
    Invert,
    Fill,
}

#[derive(Debug)]
pub struct MockProgram {
    pub id: u32,
    uniforms: HashSet<String>,
    attributes: Vec<String>,
    raster: Raster,
}

#[derive(Debug)]
pub struct MockTarget {
    id: u32,
    desc: RenderTargetDesc,
}

#[derive(Debug)]
pub struct MockQuad;

#[derive(Debug)]
pub struct RecordingDevice {
    stats: SharedStats,
    max_target_pixels: Option<u32>,
    next_id: u32,
    textures: HashMap<u32, (SourceFormat, Vec<u8>)>,
    bound_texture: Option<u32>,
    current_program: Option<(u32, Raster)>,
    /// Rendered RGBA8 contents per target id.
    framebuffers: HashMap<u32, Vec<[u8; 4]>>,
}

impl RecordingDevice {
    // A failed assertion may poison the lock while the filter is still alive; the filter's drop
    // must still be able to count releases.
    fn stats(&self) -> MutexGuard<'_, Stats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        let Some((format, data)) = self.bound_texture.and_then(|t| self.textures.get(&t)) else {
            return [0, 0, 0, 0];
        };
        let x = ((u * format.width as f32) as u32).min(format.width - 1) as usize;
        let y = ((v * format.height as f32) as u32).min(format.height - 1) as usize;
        let i = (y * format.width as usize + x) * format.channels as usize;
        match format.channels {
            1 => [data[i], data[i], data[i], 255],
            _ => [data[i], data[i + 1], data[i + 2], data[i + 3]],
        }
    }
}

/// Names declared as `<keyword> <type> <name>;` anywhere in `src`.
fn declared(src: &str, keyword: &str) -> Vec<String> {
    src.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(keyword))
        .filter_map(|rest| rest.split_whitespace().nth(1))
        .map(|name| name.trim_end_matches(';').to_string())
        .collect()
}

impl Device for RecordingDevice {
    type Texture = MockTexture;
    type Program = MockProgram;
    type Target = MockTarget;
    type Quad = MockQuad;

    fn create_target(&mut self, desc: &RenderTargetDesc) -> Result<MockTarget, FilterError> {
        if let Some(max) = self.max_target_pixels {
            if desc.width * desc.height > max {
                return Err(FilterError::GlCreate(format!(
                    "renderbuffer {}x{} exceeds limit",
                    desc.width, desc.height
                )));
            }
        }
        let id = self.id();
        self.framebuffers
            .insert(id, vec![[0; 4]; (desc.width * desc.height) as usize]);
        let mut stats = self.stats();
        stats.targets_created += 1;
        stats.live_targets += 1;
        stats.last_target = Some(*desc);
        Ok(MockTarget { id, desc: *desc })
    }

    fn delete_target(&mut self, target: MockTarget) {
        self.framebuffers.remove(&target.id);
        self.stats().live_targets -= 1;
    }

    fn create_quad(&mut self) -> Result<MockQuad, FilterError> {
        self.stats().live_quads += 1;
        Ok(MockQuad)
    }

    fn delete_quad(&mut self, _quad: MockQuad) {
        self.stats().live_quads -= 1;
    }

    fn create_texture(&mut self, format: &SourceFormat) -> Result<MockTexture, FilterError> {
        let id = self.id();
        self.textures.insert(id, (*format, vec![0; format.byte_len()]));
        let mut stats = self.stats();
        stats.textures_created += 1;
        stats.live_textures += 1;
        Ok(MockTexture { id })
    }

    fn update_texture(&mut self, texture: &MockTexture, src: &SourceImage<'_>) -> Result<(), FilterError> {
        let Some((format, data)) = self.textures.get_mut(&texture.id) else {
            return Err(FilterError::GlCreate("update of deleted texture".into()));
        };
        if *format != src.format() {
            return Err(FilterError::BufferSize {
                what: "texture upload",
                expected: format.byte_len(),
                actual: src.data().len(),
            });
        }
        data.copy_from_slice(src.data());
        self.stats().texture_updates += 1;
        Ok(())
    }

    fn bind_texture(&mut self, texture: &MockTexture, unit: u32) {
        assert_eq!(unit, 0, "pipeline only samples unit 0");
        self.bound_texture = Some(texture.id);
    }

    fn delete_texture(&mut self, texture: MockTexture) {
        self.textures.remove(&texture.id);
        if self.bound_texture == Some(texture.id) {
            self.bound_texture = None;
        }
        self.stats().live_textures -= 1;
    }

    fn compile_program(&mut self, source: &ShaderSource) -> Result<MockProgram, FilterError> {
        if !source.vert.contains("void main") {
            self.stats().compile_failures += 1;
            return Err(FilterError::VertexCompile("0:1: no main() in vertex shader".into()));
        }
        if !source.frag.contains("void main") {
            self.stats().compile_failures += 1;
            return Err(FilterError::FragmentCompile("0:1: no main() in fragment shader".into()));
        }

        let raster = if source.frag == PASSTHROUGH_FRAG {
            Raster::Passthrough
        } else if source.frag == INVERT_FRAG {
            Raster::Invert
        } else {
            Raster::Fill
        };
        let uniforms = declared(&source.vert, "uniform")
            .into_iter()
            .chain(declared(&source.frag, "uniform"))
            .collect();
        let attributes = declared(&source.vert, "attribute");

        let id = self.id();
        let mut stats = self.stats();
        stats.programs.push(id);
        stats.live_programs += 1;
        Ok(MockProgram {
            id,
            uniforms,
            attributes,
            raster,
        })
    }

    fn use_program(&mut self, program: &MockProgram) {
        self.current_program = Some((program.id, program.raster));
    }

    fn set_uniform(&mut self, program: &MockProgram, name: &str, value: ParamValue) -> bool {
        let mut stats = self.stats();
        if !program.uniforms.contains(name) {
            stats.skipped_uniforms.push(name.to_string());
            return false;
        }
        stats.uniform_writes.push(UniformWrite {
            program: program.id,
            name: name.to_string(),
            value,
        });
        true
    }

    fn attribute_location(&self, program: &MockProgram, name: &str) -> Option<u32> {
        program
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn delete_program(&mut self, program: MockProgram) {
        if matches!(self.current_program, Some((id, _)) if id == program.id) {
            self.current_program = None;
        }
        self.stats().live_programs -= 1;
    }

    fn draw_quad(&mut self, target: &MockTarget, _quad: &MockQuad, attrs: QuadAttributes) {
        let raster = self.current_program.map(|(_, r)| r).unwrap_or(Raster::Fill);
        let (w, h) = (target.desc.width, target.desc.height);
        let mut pixels = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let u = (x as f32 + 0.5) / w as f32;
                let v = (y as f32 + 0.5) / h as f32;
                let px = match (raster, attrs.texcoord) {
                    (Raster::Passthrough, Some(_)) => self.sample(u, v),
                    (Raster::Invert, Some(_)) => {
                        let [r, g, b, a] = self.sample(u, v);
                        [255 - r, 255 - g, 255 - b, a]
                    }
                    _ => [OPAQUE_FILL; 4],
                };
                pixels.push(px);
            }
        }
        self.framebuffers.insert(target.id, pixels);
        self.stats().draws += 1;
    }

    fn read_pixels(&mut self, target: &MockTarget, dst: &mut DestImage<'_>) -> Result<(), FilterError> {
        if dst.desc() != target.desc {
            return Err(FilterError::BufferSize {
                what: "readback destination",
                expected: target.desc.byte_len(),
                actual: dst.data().len(),
            });
        }
        let Some(pixels) = self.framebuffers.get(&target.id) else {
            return Err(FilterError::GlCreate("readback of deleted target".into()));
        };
        let kind = dst.kind();
        let out = dst.data_mut();
        for (i, px) in pixels.iter().enumerate() {
            match kind {
                PixelKind::Rgba8 => out[i * 4..i * 4 + 4].copy_from_slice(px),
                PixelKind::Rgb565 => {
                    let packed = pack_rgb565(px[0], px[1], px[2]).to_ne_bytes();
                    out[i * 2..i * 2 + 2].copy_from_slice(&packed);
                }
            }
        }
        self.stats().readbacks += 1;
        Ok(())
    }
}

impl Drop for RecordingDevice {
    fn drop(&mut self) {
        self.stats().device_dropped = true;
    }
}

pub type RecordingFilter = shadefilter_runtime::FilterGpu<RecordingProvider>;

pub fn filter(provider: &RecordingProvider) -> RecordingFilter {
    RecordingFilter::new("contract", provider.clone())
}

/// Runs one frame into a fresh `fill`-initialised destination and returns it.
pub fn run(
    filter: &RecordingFilter,
    src: &SourceImage<'_>,
    (width, height, kind): (u32, u32, PixelKind),
    fill: u8,
) -> (Result<(), FilterError>, Vec<u8>) {
    let mut out = vec![fill; RenderTargetDesc { width, height, kind }.byte_len()];
    let mut dst = DestImage::new(width, height, kind, &mut out).expect("destination");
    let result = filter.process(src, &mut dst);
    (result, out)
}
