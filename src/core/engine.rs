use crate::domain::model::{CanonicalRow, ColumnDescriptor, ExportRequest};
use crate::domain::ports::{ReportPipeline, Storage};
use crate::utils::cancel::CancelToken;
use crate::utils::error::{ReportError, Result};
use tracing::Instrument;

pub struct ReportEngine<P: ReportPipeline, S: Storage> {
    pipeline: P,
    storage: S,
}

impl<P: ReportPipeline, S: Storage> ReportEngine<P, S> {
    pub fn new(pipeline: P, storage: S) -> Self {
        Self { pipeline, storage }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Extract + transform. A cancelled token yields `Cancelled` even when
    /// the fetch itself finished first.
    pub async fn load(&self, cancel: &CancelToken) -> Result<Vec<CanonicalRow>> {
        let name = self.pipeline.schema().name;
        async {
            tracing::info!("📡 Fetching {}...", name);
            let records = self.pipeline.extract(cancel).await?;
            tracing::info!("📥 Received {} records", records.len());

            if cancel.is_cancelled() {
                return Err(ReportError::Cancelled);
            }

            let rows = self.pipeline.transform(records)?;
            tracing::info!("🔄 {} rows ready", rows.len());
            Ok(rows)
        }
        .instrument(tracing::info_span!("load", report = name))
        .await
    }

    /// Encodes the rows and hands the artifact to storage. Returns the path
    /// reported by storage.
    pub async fn export(
        &self,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<String> {
        let artifact = self.pipeline.export(rows, columns, request)?;
        tracing::debug!(
            "💾 Writing {} ({} bytes)",
            artifact.filename,
            artifact.bytes.len()
        );
        let path = self
            .storage
            .write_file(&artifact.filename, &artifact.bytes)
            .await?;
        tracing::info!("📁 Export saved to: {}", path);
        Ok(path)
    }
}
