pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{FileSessionStore, GdmsClient, MemorySessionStore, Organization, PbxClient};
pub use app::{CdrPipeline, DevicePipeline, SipPipeline};
pub use config::{cli::LocalStorage, AppConfig, ConfigOverrides};
pub use core::{engine::ReportEngine, export::ReportExporter, format::CellFormatter, view::ReportView};
pub use domain::model::{DateRange, ExportRequest, Timezone};
pub use domain::session::Session;
pub use utils::cancel::CancelToken;
pub use utils::error::{ReportError, Result};

#[cfg(feature = "cli")]
pub use config::CliConfig;
