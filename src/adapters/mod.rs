//! Concrete collaborators: HTTP clients for the PBX and GDMS backends and
//! session persistence.

pub mod gdms;
pub mod pbx;
pub mod session;

pub use gdms::{GdmsClient, Organization};
pub use pbx::PbxClient;
pub use session::{FileSessionStore, MemorySessionStore};

/// `base` may or may not end with a slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Response body as the error message, or `fallback` when the body is empty
/// or unreadable.
pub(crate) async fn error_text(response: reqwest::Response, fallback: String) -> String {
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => fallback,
    }
}
