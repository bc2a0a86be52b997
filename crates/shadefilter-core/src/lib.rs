//! Backend-agnostic types shared by the shadefilter crates.
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod builtin;
pub mod config;
pub mod error;
pub mod image;
pub mod params;
pub mod source;

pub use builtin::BuiltinShader;
pub use config::{FilterPreset, ShaderRef};
pub use error::{ErrorClass, FilterError};
pub use image::{DestImage, PixelKind, RenderTargetDesc, SourceFormat, SourceImage};
pub use params::{ParamTable, ParamValue};
pub use source::ShaderSource;
