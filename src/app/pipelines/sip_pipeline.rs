use crate::adapters::GdmsClient;
use crate::core::export::{ReportExporter, SIP_EXPORT_LABEL};
use crate::core::normalizer::normalize_records;
use crate::core::{CanonicalRow, ColumnDescriptor, Record, ReportPipeline, SessionStore};
use crate::domain::model::{ExportArtifact, ExportRequest};
use crate::domain::schema::{ReportSchema, SIP_SCHEMA};
use crate::utils::cancel::CancelToken;
use crate::utils::error::Result;

pub struct SipPipeline<S: SessionStore> {
    client: GdmsClient<S>,
    org_id: String,
    exporter: ReportExporter,
}

impl<S: SessionStore> SipPipeline<S> {
    pub fn new(client: GdmsClient<S>, org_id: impl Into<String>, exporter: ReportExporter) -> Self {
        Self {
            client,
            org_id: org_id.into(),
            exporter,
        }
    }
}

#[async_trait::async_trait]
impl<S: SessionStore> ReportPipeline for SipPipeline<S> {
    fn schema(&self) -> &'static ReportSchema {
        &SIP_SCHEMA
    }

    async fn extract(&self, cancel: &CancelToken) -> Result<Vec<Record>> {
        self.client
            .sip_report(&self.org_id, cancel, |items| {
                tracing::info!("☎️ {} SIP accounts received so far", items.len());
            })
            .await
    }

    fn transform(&self, data: Vec<Record>) -> Result<Vec<CanonicalRow>> {
        Ok(normalize_records(&SIP_SCHEMA, &data))
    }

    /// SIP accounts export as CSV, not a workbook.
    fn export(
        &self,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        self.exporter
            .csv_document(SIP_EXPORT_LABEL, &SIP_SCHEMA, rows, columns, request)
    }
}
