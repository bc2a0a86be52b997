use shadefilter_core::{DestImage, FilterError, ParamValue, ShaderSource, SourceImage};

use crate::device::DeviceProvider;
use crate::pipeline::FilterGpu;

/// What a host framework needs from an image filter. No base class, no framework types.
pub trait ImageFilter {
    fn configure(&self, source: ShaderSource);
    fn set_param(&self, name: &str, value: ParamValue);
    fn process(&self, src: &SourceImage<'_>, dst: &mut DestImage<'_>) -> Result<(), FilterError>;
}

impl<P: DeviceProvider> ImageFilter for FilterGpu<P> {
    fn configure(&self, source: ShaderSource) {
        self.set_source(source);
    }

    fn set_param(&self, name: &str, value: ParamValue) {
        FilterGpu::set_param(self, name, value);
    }

    fn process(&self, src: &SourceImage<'_>, dst: &mut DestImage<'_>) -> Result<(), FilterError> {
        FilterGpu::process(self, src, dst)
    }
}
