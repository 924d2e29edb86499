use crate::adapters::GdmsClient;
use crate::core::export::ReportExporter;
use crate::core::normalizer::normalize_records;
use crate::core::{CanonicalRow, ColumnDescriptor, Record, ReportPipeline, SessionStore};
use crate::domain::model::{ExportArtifact, ExportRequest};
use crate::domain::schema::{ReportSchema, DEVICE_SCHEMA};
use crate::utils::cancel::CancelToken;
use crate::utils::error::Result;

/// MAC report of one GDMS organization.
pub struct DevicePipeline<S: SessionStore> {
    client: GdmsClient<S>,
    org_id: String,
    exporter: ReportExporter,
}

impl<S: SessionStore> DevicePipeline<S> {
    pub fn new(client: GdmsClient<S>, org_id: impl Into<String>, exporter: ReportExporter) -> Self {
        Self {
            client,
            org_id: org_id.into(),
            exporter,
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }
}

#[async_trait::async_trait]
impl<S: SessionStore> ReportPipeline for DevicePipeline<S> {
    fn schema(&self) -> &'static ReportSchema {
        &DEVICE_SCHEMA
    }

    async fn extract(&self, cancel: &CancelToken) -> Result<Vec<Record>> {
        self.client
            .device_report(&self.org_id, cancel, |items| {
                tracing::info!("📶 {} devices received so far", items.len());
            })
            .await
    }

    fn transform(&self, data: Vec<Record>) -> Result<Vec<CanonicalRow>> {
        Ok(normalize_records(&DEVICE_SCHEMA, &data))
    }

    fn export(
        &self,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        self.exporter
            .device_workbook(&DEVICE_SCHEMA, rows, columns, request)
    }
}
