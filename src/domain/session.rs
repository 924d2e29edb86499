use serde::{Deserialize, Serialize};

/// 登入後保存的用戶端狀態；取代瀏覽器的 localStorage / sessionStorage
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbx_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbx_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbx_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdms_token: Option<String>,
}

/// Token plus the cached login the report endpoint wants in its body.
#[derive(Clone, PartialEq, Eq)]
pub struct PbxCredentials {
    pub token: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PbxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PbxCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Session {
    pub fn is_pbx_logged_in(&self) -> bool {
        present(&self.pbx_token).is_some()
    }

    pub fn is_gdms_logged_in(&self) -> bool {
        present(&self.gdms_token).is_some()
    }

    pub fn pbx_credentials(&self) -> Option<PbxCredentials> {
        Some(PbxCredentials {
            token: present(&self.pbx_token)?.to_string(),
            username: present(&self.pbx_username)?.to_string(),
            password: present(&self.pbx_password)?.to_string(),
        })
    }

    pub fn gdms_token(&self) -> Option<&str> {
        present(&self.gdms_token)
    }

    pub fn set_pbx_login(&mut self, token: String, username: String, password: String) {
        self.pbx_token = Some(token);
        self.pbx_username = Some(username);
        self.pbx_password = Some(password);
    }

    /// 401 時只丟掉 token
    pub fn forget_pbx_token(&mut self) {
        self.pbx_token = None;
    }

    pub fn clear_pbx(&mut self) {
        self.pbx_token = None;
        self.pbx_username = None;
        self.pbx_password = None;
    }

    pub fn set_gdms_token(&mut self, token: String) {
        self.gdms_token = Some(token);
    }

    pub fn clear_gdms(&mut self) {
        self.gdms_token = None;
    }

    pub fn is_empty(&self) -> bool {
        self == &Session::default()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pbx_logged_in", &self.is_pbx_logged_in())
            .field("pbx_username", &self.pbx_username)
            .field("gdms_logged_in", &self.is_gdms_logged_in())
            .finish()
    }
}
