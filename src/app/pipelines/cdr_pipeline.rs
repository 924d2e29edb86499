use crate::adapters::PbxClient;
use crate::core::export::ReportExporter;
use crate::core::filter::filter_by_date_range;
use crate::core::normalizer::normalize_records;
use crate::core::{CanonicalRow, ColumnDescriptor, Record, ReportPipeline, SessionStore};
use crate::domain::model::{DateRange, ExportArtifact, ExportRequest};
use crate::domain::schema::{ReportSchema, CDR_SCHEMA};
use crate::utils::cancel::CancelToken;
use crate::utils::error::Result;

/// 本地端日期過濾用的欄位
const DATE_FIELD: &str = "start_time";

pub struct CdrPipeline<S: SessionStore> {
    client: PbxClient<S>,
    range: DateRange,
    exporter: ReportExporter,
}

impl<S: SessionStore> CdrPipeline<S> {
    pub fn new(client: PbxClient<S>, range: DateRange, exporter: ReportExporter) -> Self {
        Self {
            client,
            range,
            exporter,
        }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn client(&self) -> &PbxClient<S> {
        &self.client
    }
}

#[async_trait::async_trait]
impl<S: SessionStore> ReportPipeline for CdrPipeline<S> {
    fn schema(&self) -> &'static ReportSchema {
        &CDR_SCHEMA
    }

    async fn extract(&self, cancel: &CancelToken) -> Result<Vec<Record>> {
        self.client.fetch_report(&self.range, cancel).await
    }

    /// Normalizes every record, then re-applies the date window locally in
    /// case the backend ignored it.
    fn transform(&self, data: Vec<Record>) -> Result<Vec<CanonicalRow>> {
        let rows = normalize_records(&CDR_SCHEMA, &data);
        Ok(filter_by_date_range(
            self.exporter.formatter(),
            rows,
            &self.range,
            DATE_FIELD,
        ))
    }

    fn export(
        &self,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        self.exporter
            .cdr_workbook(&CDR_SCHEMA, rows, columns, request)
    }
}
