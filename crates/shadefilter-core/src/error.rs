use std::path::PathBuf;
use std::thread::ThreadId;

/// Broad classes of filter failures.
///
/// The class decides how a caller should react: `Context` errors leave the pipeline unusable,
/// everything else only fails the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Display/context/framebuffer creation failed. Fatal.
    Context,
    /// Shader compile or link failure. The previous program stays installed.
    Program,
    /// Unsupported channel count, pixel kind or buffer size. Nothing on the GPU was touched.
    Format,
    /// Preset loading problems.
    Config,
}

/// Errors used across shadefilter crates.
///
/// Contract rule: this type lives in `shadefilter-core` and is re-exported by the runtimes.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    // ---- Context (fatal) ----
    #[error("gpu context initialization failed: {0}")]
    ContextInit(String),

    #[error("gpu context is unusable after an earlier failure; recreate the filter")]
    ContextUnusable,

    #[error("gpu context is bound to thread {owner:?}, process() was called from {caller:?}")]
    WrongThread { owner: ThreadId, caller: ThreadId },

    #[error("backend object creation failed: {0}")]
    GlCreate(String),

    // ---- Program ----
    #[error("vertex shader compile error: {0}")]
    VertexCompile(String),

    #[error("fragment shader compile error: {0}")]
    FragmentCompile(String),

    #[error("program link error: {0}")]
    Link(String),

    #[error("no shader program has been set")]
    NoProgram,

    // ---- Format ----
    #[error("unsupported source channel count {0} (expected 1 or 4)")]
    UnsupportedChannels(u8),

    #[error("unsupported destination pixel kind {0}")]
    UnsupportedPixelKind(String),

    #[error("{what} buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("readback format not supported by the driver: {0}")]
    ReadFormat(String),

    // ---- Presets ----
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json parse error at {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config at {}: {msg}", .path.display())]
    InvalidConfig { path: PathBuf, msg: String },
}

impl FilterError {
    pub fn class(&self) -> ErrorClass {
        use FilterError::*;
        match self {
            ContextInit(_) | ContextUnusable | WrongThread { .. } | GlCreate(_) => {
                ErrorClass::Context
            }
            VertexCompile(_) | FragmentCompile(_) | Link(_) | NoProgram => ErrorClass::Program,
            UnsupportedChannels(_) | UnsupportedPixelKind(_) | BufferSize { .. } | ReadFormat(_) => {
                ErrorClass::Format
            }
            Io { .. } | Json { .. } | InvalidConfig { .. } => ErrorClass::Config,
        }
    }

    /// True when the pipeline can no longer render and must be recreated.
    ///
    /// `WrongThread` and `GlCreate` are context-class but not fatal by themselves: the runtime
    /// reports any failure that poisons the context as `ContextInit`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FilterError::ContextInit(_) | FilterError::ContextUnusable)
    }
}
