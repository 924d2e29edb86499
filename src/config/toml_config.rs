use crate::core::ConfigProvider;
use crate::domain::model::Timezone;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub report: ReportConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub pbx_base_url: String,
    pub gdms_base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            pbx_base_url: DEFAULT_BASE_URL.to_string(),
            gdms_base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "./.connectview/session.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub page_size: usize,
    pub timezone: Timezone,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_size: crate::core::paginate::DEFAULT_PAGE_SIZE,
            timezone: Timezone::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
    pub column_width: u16,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            column_width: crate::core::export::DEFAULT_COLUMN_WIDTH,
        }
    }
}

/// 命令列參數蓋過設定檔
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub pbx_base_url: Option<String>,
    pub gdms_base_url: Option<String>,
    pub output_path: Option<String>,
    pub session_path: Option<String>,
    pub timezone: Option<Timezone>,
    pub page_size: Option<usize>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("Loaded configuration from {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// `${VAR}` 換成環境變數；未定義的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.pbx_base_url {
            self.server.pbx_base_url = url;
        }
        if let Some(url) = overrides.gdms_base_url {
            self.server.gdms_base_url = url;
        }
        if let Some(path) = overrides.output_path {
            self.export.output_path = path;
        }
        if let Some(path) = overrides.session_path {
            self.session.path = path;
        }
        if let Some(timezone) = overrides.timezone {
            self.report.timezone = timezone;
        }
        if let Some(page_size) = overrides.page_size {
            self.report.page_size = page_size;
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("server.pbx_base_url", &self.server.pbx_base_url)?;
        validate_url("server.gdms_base_url", &self.server.gdms_base_url)?;
        validate_positive_number("server.timeout_seconds", self.server.timeout_seconds, 1)?;
        validate_path("session.path", &self.session.path)?;
        validate_path("export.output_path", &self.export.output_path)?;
        validate_range("report.page_size", self.report.page_size, 1, 1000)?;
        validate_range("export.column_width", self.export.column_width, 1, 255)?;
        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn pbx_base_url(&self) -> &str {
        &self.server.pbx_base_url
    }

    fn gdms_base_url(&self) -> &str {
        &self.server.gdms_base_url
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn session_path(&self) -> &str {
        &self.session.path
    }

    fn page_size(&self) -> usize {
        self.report.page_size
    }

    fn timezone(&self) -> Timezone {
        self.report.timezone
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_seconds)
    }

    fn column_width(&self) -> u16 {
        self.export.column_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ReportError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.column_width(), 18);
        assert_eq!(config.timezone(), Timezone::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config = AppConfig::from_toml_str(
            r#"
[server]
pbx_base_url = "https://pbx.example.com/"
timeout_seconds = 5

[report]
page_size = 25
timezone = "utc"
"#,
        )
        .unwrap();

        assert_eq!(config.pbx_base_url(), "https://pbx.example.com/");
        assert_eq!(config.gdms_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.page_size(), 25);
        assert_eq!(config.timezone(), Timezone::Utc);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CONNECTVIEW_TEST_GDMS_URL", "https://gdms.test");
        let config = AppConfig::from_toml_str(
            r#"
[server]
gdms_base_url = "${CONNECTVIEW_TEST_GDMS_URL}"
pbx_base_url = "${CONNECTVIEW_TEST_UNSET_VAR}"
"#,
        )
        .unwrap();
        std::env::remove_var("CONNECTVIEW_TEST_GDMS_URL");

        assert_eq!(config.gdms_base_url(), "https://gdms.test");
        assert_eq!(config.pbx_base_url(), "${CONNECTVIEW_TEST_UNSET_VAR}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let err = AppConfig::from_toml_str("[report]\npage_size = \"many\"").unwrap_err();
        assert!(matches!(err, ReportError::ConfigParseError(_)));
    }

    #[test]
    fn test_validation_bounds() {
        let mut config = AppConfig::default();
        config.report.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.export.output_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_overrides(ConfigOverrides {
            pbx_base_url: Some("http://127.0.0.1:9000".to_string()),
            timezone: Some(Timezone::Utc),
            ..Default::default()
        });
        assert_eq!(config.pbx_base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.timezone(), Timezone::Utc);
        assert_eq!(config.output_path(), "./output");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[export]\noutput_path = \"./reports\"\ncolumn_width = 24\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_path(), "./reports");
        assert_eq!(config.column_width(), 24);
    }
}
