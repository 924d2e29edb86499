pub mod cli;
pub mod toml_config;

pub use toml_config::{AppConfig, ConfigOverrides};

#[cfg(feature = "cli")]
pub use self::args::{CdrArgs, CliConfig, Command, GdmsReportArgs, ViewArgs};

#[cfg(feature = "cli")]
mod args {
    use super::{AppConfig, ConfigOverrides};
    use crate::domain::model::Timezone;
    use crate::utils::error::Result;
    use clap::{Args, Parser, Subcommand};
    use std::path::{Path, PathBuf};

    /// 沒有 --config 時，工作目錄下有這個檔案就讀它
    const DEFAULT_CONFIG_FILE: &str = "connectview.toml";

    #[derive(Debug, Clone, Parser)]
    #[command(name = "connectview")]
    #[command(about = "PBX call-detail and GDMS device reports from the terminal")]
    pub struct CliConfig {
        #[arg(long, global = true, help = "Path to a TOML configuration file")]
        pub config: Option<PathBuf>,

        #[arg(long, global = true)]
        pub pbx_url: Option<String>,

        #[arg(long, global = true)]
        pub gdms_url: Option<String>,

        #[arg(long, global = true, help = "Directory for exported reports")]
        pub output_path: Option<String>,

        #[arg(long, global = true)]
        pub session_path: Option<String>,

        #[arg(long, global = true, help = "Zone for dates without offset: local | utc")]
        pub timezone: Option<Timezone>,

        #[arg(long, global = true)]
        pub page_size: Option<usize>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Log in to the PBX and remember the session
        Login {
            #[arg(short, long)]
            username: String,
            /// Read from stdin when omitted
            #[arg(short, long)]
            password: Option<String>,
        },
        /// Forget stored credentials (both systems when no flag is given)
        Logout {
            #[arg(long)]
            pbx: bool,
            #[arg(long)]
            gdms: bool,
        },
        /// Store a GDMS access token
        GdmsLogin {
            #[arg(long)]
            token: String,
        },
        /// Call-detail report
        Cdr(CdrArgs),
        /// List GDMS organizations
        Orgs,
        /// Device (MAC) report of an organization
        MacReport(GdmsReportArgs),
        /// SIP account report of an organization
        SipReport(GdmsReportArgs),
    }

    #[derive(Debug, Clone, Args)]
    pub struct ViewArgs {
        #[arg(long, help = "Case-insensitive free-text filter")]
        pub search: Option<String>,

        #[arg(long, default_value = "1")]
        pub page: usize,

        #[arg(long, value_delimiter = ',', help = "Column keys to show (default: all)")]
        pub columns: Vec<String>,

        #[arg(long, help = "Write the full report to the output directory")]
        pub export: bool,
    }

    #[derive(Debug, Clone, Args)]
    pub struct CdrArgs {
        #[arg(long, help = "YYYY-MM-DD")]
        pub from: Option<String>,

        #[arg(long, help = "YYYY-MM-DD")]
        pub to: Option<String>,

        #[command(flatten)]
        pub view: ViewArgs,
    }

    #[derive(Debug, Clone, Args)]
    pub struct GdmsReportArgs {
        #[arg(long)]
        pub org_id: String,

        #[command(flatten)]
        pub view: ViewArgs,
    }

    impl CliConfig {
        pub fn overrides(&self) -> ConfigOverrides {
            ConfigOverrides {
                pbx_base_url: self.pbx_url.clone(),
                gdms_base_url: self.gdms_url.clone(),
                output_path: self.output_path.clone(),
                session_path: self.session_path.clone(),
                timezone: self.timezone,
                page_size: self.page_size,
            }
        }

        /// File (explicit or default) + flags. Validation is left to the caller.
        pub fn load_config(&self) -> Result<AppConfig> {
            let mut config = match &self.config {
                Some(path) => AppConfig::from_file(path)?,
                None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                    AppConfig::from_file(DEFAULT_CONFIG_FILE)?
                }
                None => AppConfig::default(),
            };
            config.apply_overrides(self.overrides());
            Ok(config)
        }
    }

}
