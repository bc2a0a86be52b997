//! Backend-agnostic filter pipeline.
//!
//! `FilterGpu` owns configuration (shader source, parameters) and, once `process()` has run,
//! the device state derived from it. Backends plug in through [`Device`] and [`DeviceProvider`].
#![deny(rustdoc::broken_intra_doc_links)]

pub mod context;
pub mod device;
pub mod filter;
pub mod pipeline;
pub mod thread;

pub use context::ContextManager;
pub use device::{Device, DeviceProvider, QuadAttributes};
pub use filter::ImageFilter;
pub use pipeline::FilterGpu;
pub use thread::ThreadBound;

pub use shadefilter_core::{
    DestImage, ErrorClass, FilterError, FilterPreset, ParamValue, PixelKind, RenderTargetDesc,
    ShaderSource, SourceFormat, SourceImage,
};
