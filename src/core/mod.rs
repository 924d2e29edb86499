pub mod columns;
pub mod engine;
pub mod export;
pub mod filter;
pub mod flatten;
pub mod format;
pub mod normalizer;
pub mod paginate;
pub mod stream;
pub mod view;

pub use crate::domain::model::{CanonicalRow, ColumnDescriptor, Record};
pub use crate::domain::ports::{ConfigProvider, ReportPipeline, SessionStore, Storage};
pub use crate::utils::error::Result;
