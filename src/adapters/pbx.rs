//! PBX backend: login / logout and the filtered CDR report.

use crate::adapters::{endpoint, error_text};
use crate::domain::model::{DateRange, Record};
use crate::domain::ports::SessionStore;
use crate::utils::cancel::CancelToken;
use crate::utils::error::{ReportError, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ReportBody<'a> {
    username: &'a str,
    password: &'a str,
    from: String,
    to: String,
}

pub struct PbxClient<S: SessionStore> {
    client: Client,
    base_url: String,
    store: S,
}

impl<S: SessionStore> PbxClient<S> {
    pub fn new(base_url: impl Into<String>, store: S, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
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

    /// 成功時 token / 帳號 / 密碼都存進 session
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        if username.is_empty() || password.is_empty() {
            return Err(ReportError::AuthFailed {
                message: "Please enter username and password".to_string(),
            });
        }

        let url = endpoint(&self.base_url, "/pbx/auth/login");
        tracing::debug!("🔐 POST {} as {}", url, username);
        let response = self
            .client
            .post(&url)
            .json(&LoginBody { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_text(response, format!("Login failed ({})", status.as_u16())).await;
            tracing::warn!("❌ PBX login rejected: {}", status);
            return Err(ReportError::AuthFailed { message });
        }

        // body 不是 JSON 時視為沒有 token
        let body: Value = response
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or(Value::Null);
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ReportError::AuthFailed {
                message: "No token returned by server".to_string(),
            })?;

        let mut session = self.store.load().await?;
        session.set_pbx_login(token.to_string(), username.to_string(), password.to_string());
        self.store.save(&session).await?;
        tracing::info!("✅ Logged in to PBX as {}", username);
        Ok(())
    }

    /// Best effort: the backend call may fail, local state is cleared anyway.
    pub async fn logout(&self) -> Result<()> {
        let url = endpoint(&self.base_url, "/pbx/auth/logout");
        if let Err(e) = self.client.post(&url).send().await {
            tracing::debug!("PBX logout request failed, ignoring: {}", e);
        }

        let mut session = self.store.load().await?;
        session.clear_pbx();
        self.store.save(&session).await?;
        tracing::info!("👋 Logged out of PBX");
        Ok(())
    }

    pub async fn fetch_report(&self, range: &DateRange, cancel: &CancelToken) -> Result<Vec<Record>> {
        range.validate()?;
        let session = self.store.load().await?;
        let credentials = session
            .pbx_credentials()
            .ok_or(ReportError::NotAuthenticated)?;

        let mut query = Vec::new();
        if range.from.is_some() {
            query.push(("from", range.from_param()));
        }
        if range.to.is_some() {
            query.push(("to", range.to_param()));
        }

        let url = endpoint(&self.base_url, "/api/users/filtered-report");
        tracing::debug!("📡 PATCH {} {:?}", url, query);
        let request = self
            .client
            .patch(&url)
            .query(&query)
            .bearer_auth(&credentials.token)
            .json(&ReportBody {
                username: &credentials.username,
                password: &credentials.password,
                from: range.from_param(),
                to: range.to_param(),
            });

        let body: Value = cancel
            .run(async {
                let response = request.send().await?;
                let status = response.status();

                if status == StatusCode::UNAUTHORIZED {
                    self.forget_token().await?;
                    return Err(ReportError::Unauthorized);
                }
                if !status.is_success() {
                    let message = error_text(response, format!("Failed ({})", status.as_u16())).await;
                    return Err(ReportError::RequestFailed {
                        status: status.as_u16(),
                        message,
                    });
                }
                Ok(response.json::<Value>().await?)
            })
            .await?;

        Ok(Record::from_values(report_items(body)))
    }

    async fn forget_token(&self) -> Result<()> {
        tracing::warn!("🔒 PBX token rejected, clearing it");
        let mut session = self.store.load().await?;
        session.forget_pbx_token();
        self.store.save(&session).await
    }
}

/// 後端可能回傳陣列，或是 `{ "data": [...] }`
fn report_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_items_shapes() {
        assert_eq!(report_items(json!([{"a": 1}])).len(), 1);
        assert_eq!(report_items(json!({"data": [{"a": 1}, {"b": 2}]})).len(), 2);
        assert!(report_items(json!({"data": {"a": 1}})).is_empty());
        assert!(report_items(json!({"rows": []})).is_empty());
        assert!(report_items(json!("nope")).is_empty());
    }
}
