pub mod cdr_pipeline;
pub mod device_pipeline;
pub mod sip_pipeline;

pub use cdr_pipeline::CdrPipeline;
pub use device_pipeline::DevicePipeline;
pub use sip_pipeline::SipPipeline;
