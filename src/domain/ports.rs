use crate::domain::model::{
    CanonicalRow, ColumnDescriptor, ExportArtifact, ExportRequest, Record, Timezone,
};
use crate::domain::schema::ReportSchema;
use crate::domain::session::Session;
use crate::utils::cancel::CancelToken;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// 憑證的 load / save / clear 生命週期
pub trait SessionStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Session>> + Send;
    fn save(&self, session: &Session) -> impl std::future::Future<Output = Result<()>> + Send;
    fn clear(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn pbx_base_url(&self) -> &str;
    fn gdms_base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn session_path(&self) -> &str;
    fn page_size(&self) -> usize;
    fn timezone(&self) -> Timezone;
    fn request_timeout(&self) -> std::time::Duration;
    fn column_width(&self) -> u16;
}

#[async_trait]
pub trait ReportPipeline: Send + Sync {
    fn schema(&self) -> &'static ReportSchema;
    async fn extract(&self, cancel: &CancelToken) -> Result<Vec<Record>>;
    fn transform(&self, data: Vec<Record>) -> Result<Vec<CanonicalRow>>;
    fn export(
        &self,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact>;
}
