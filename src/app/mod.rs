pub mod pipelines;
#[cfg(feature = "cli")]
pub mod render;

pub use pipelines::{CdrPipeline, DevicePipeline, SipPipeline};
