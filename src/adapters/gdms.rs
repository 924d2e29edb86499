//! GDMS backend: organization list plus the streamed device and SIP reports.

use crate::adapters::{endpoint, error_text};
use crate::core::stream::StreamingArrayParser;
use crate::domain::model::Record;
use crate::domain::ports::SessionStore;
use crate::utils::cancel::CancelToken;
use crate::utils::error::{ReportError, Result};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEVICE_REPORT_PATH: &str = "/gdms/report";
pub const SIP_REPORT_PATH: &str = "/gdms/sip-report";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub organization: String,
}

/// 後端的 id 有時是數字有時是字串
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "organization id must be a number or string, got {}",
            other
        ))),
    }
}

pub struct GdmsClient<S: SessionStore> {
    client: Client,
    base_url: String,
    store: S,
}

impl<S: SessionStore> GdmsClient<S> {
    pub fn new(base_url: impl Into<String>, store: S, timeout: Duration) -> Result<Self> {
        // 串流報表可能很久，timeout 只套在連線階段
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, store))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, store: S) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn login(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ReportError::AuthFailed {
                message: "Please enter a GDMS token".to_string(),
            });
        }
        let mut session = self.store.load().await?;
        session.set_gdms_token(token.to_string());
        self.store.save(&session).await?;
        tracing::info!("✅ GDMS token stored");
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let mut session = self.store.load().await?;
        session.clear_gdms();
        self.store.save(&session).await?;
        tracing::info!("👋 Logged out of GDMS");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<RequestBuilder> {
        let mut request = self.client.get(endpoint(&self.base_url, path));
        if let Some(token) = self.store.load().await?.gdms_token() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    pub async fn org_names(&self, cancel: &CancelToken) -> Result<Vec<Organization>> {
        let request = self.get("/gdms/org-names").await?;
        cancel
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let message = error_text(response, format!("Failed ({})", status.as_u16())).await;
                    return Err(ReportError::RequestFailed {
                        status: status.as_u16(),
                        message,
                    });
                }
                let orgs: Vec<Organization> = response.json().await?;
                tracing::debug!("🏢 {} organizations", orgs.len());
                Ok(orgs)
            })
            .await
    }

    pub async fn device_report<F>(
        &self,
        org_id: &str,
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<Vec<Record>>
    where
        F: FnMut(&[Value]) + Send,
    {
        let items = self
            .stream_array(DEVICE_REPORT_PATH, org_id, cancel, on_progress)
            .await?;
        Ok(Record::from_values(items))
    }

    pub async fn sip_report<F>(
        &self,
        org_id: &str,
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<Vec<Record>>
    where
        F: FnMut(&[Value]) + Send,
    {
        let items = self
            .stream_array(SIP_REPORT_PATH, org_id, cancel, on_progress)
            .await?;
        Ok(Record::from_values(items))
    }

    /// Reads the body chunk by chunk. `on_progress` sees every array that a
    /// chunk completes; each one replaces the previous.
    async fn stream_array<F>(
        &self,
        path: &str,
        org_id: &str,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<Vec<Value>>
    where
        F: FnMut(&[Value]) + Send,
    {
        let org_id = org_id.trim();
        if org_id.is_empty() {
            return Err(ReportError::ValidationError {
                message: "Choose an organization first".to_string(),
            });
        }

        let request = self.get(path).await?.query(&[("orgId", org_id)]);
        tracing::debug!("📡 GET {}?orgId={}", path, org_id);

        cancel
            .run(async {
                let mut response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ReportError::RequestFailed {
                        status: status.as_u16(),
                        message: format!("Failed ({})", status.as_u16()),
                    });
                }

                let mut parser = StreamingArrayParser::new();
                let mut chunks = 0usize;
                while let Some(chunk) = response.chunk().await? {
                    chunks += 1;
                    if let Some(items) = parser.push(&chunk) {
                        on_progress(items);
                    }
                }
                tracing::debug!(
                    "📦 {}: {} chunks, {} bytes",
                    path,
                    chunks,
                    parser.buffered_bytes()
                );
                parser.finish()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_organization_ids_accept_numbers_and_strings() {
        let orgs: Vec<Organization> = serde_json::from_value(json!([
            {"id": 12, "organization": "Head Office"},
            {"id": "A-7", "organization": "Branch"},
            {"id": 3}
        ]))
        .unwrap();
        assert_eq!(orgs[0].id, "12");
        assert_eq!(orgs[1].id, "A-7");
        assert_eq!(orgs[2].organization, "");
    }

    #[test]
    fn test_organization_rejects_object_id() {
        let result: std::result::Result<Organization, _> =
            serde_json::from_value(json!({"id": {"x": 1}, "organization": "?"}));
        assert!(result.is_err());
    }
}
