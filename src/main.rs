use clap::Parser;
use connectview::app::render::{render_organizations, render_page};
use connectview::config::{Command, ViewArgs};
use connectview::core::ConfigProvider;
use connectview::core::ReportPipeline;
use connectview::utils::error::ErrorSeverity;
use connectview::utils::{logger, validation::Validate};
use connectview::{
    AppConfig, CancelToken, CdrPipeline, CellFormatter, CliConfig, DateRange, DevicePipeline,
    FileSessionStore, GdmsClient, LocalStorage, PbxClient, ReportEngine, ReportError,
    ReportExporter, ReportView, Result, SipPipeline,
};
use tokio::io::AsyncBufReadExt;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    // 載入並驗證配置
    let config = match cli.load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            std::process::exit(report_error(&e));
        }
    };
    tracing::debug!("Config: {:?}", config);

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupted, cancelling in-flight request");
            on_interrupt.cancel();
        }
    });

    match run(cli.command, &config, &cancel).await {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {
            tracing::info!("Request cancelled");
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            let exit_code = report_error(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

/// Prints the error for the user and returns the exit code for its severity.
fn report_error(e: &ReportError) -> i32 {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

async fn run(command: Command, config: &AppConfig, cancel: &CancelToken) -> Result<()> {
    let store = FileSessionStore::new(config.session_path());
    let exporter = ReportExporter::new(CellFormatter::new(config.timezone()), config.column_width());

    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password().await?,
            };
            let client = PbxClient::new(config.pbx_base_url(), store, config.request_timeout())?;
            client.login(username.trim(), &password).await?;
            println!("✅ Logged in as {}", username.trim());
        }
        Command::Logout { pbx, gdms } => {
            // 沒指定就兩邊都登出
            let both = !pbx && !gdms;
            if pbx || both {
                PbxClient::new(config.pbx_base_url(), store.clone(), config.request_timeout())?
                    .logout()
                    .await?;
            }
            if gdms || both {
                GdmsClient::new(config.gdms_base_url(), store, config.request_timeout())?
                    .logout()
                    .await?;
            }
            println!("👋 Logged out");
        }
        Command::GdmsLogin { token } => {
            GdmsClient::new(config.gdms_base_url(), store, config.request_timeout())?
                .login(&token)
                .await?;
            println!("✅ GDMS token saved");
        }
        Command::Cdr(args) => {
            // to < from 在送出請求前就擋下
            let range = DateRange::parse(args.from.as_deref(), args.to.as_deref())?;
            let client = PbxClient::new(config.pbx_base_url(), store, config.request_timeout())?;
            let pipeline = CdrPipeline::new(client, range, exporter);
            show_report(pipeline, &args.view, range, config, cancel).await?;
        }
        Command::Orgs => {
            let client = GdmsClient::new(config.gdms_base_url(), store, config.request_timeout())?;
            let orgs = client.org_names(cancel).await?;
            println!("{}", render_organizations(&orgs));
        }
        Command::MacReport(args) => {
            let client = GdmsClient::new(config.gdms_base_url(), store, config.request_timeout())?;
            let pipeline = DevicePipeline::new(client, args.org_id, exporter);
            show_report(pipeline, &args.view, DateRange::default(), config, cancel).await?;
        }
        Command::SipReport(args) => {
            let client = GdmsClient::new(config.gdms_base_url(), store, config.request_timeout())?;
            let pipeline = SipPipeline::new(client, args.org_id, exporter);
            show_report(pipeline, &args.view, DateRange::default(), config, cancel).await?;
        }
    }

    Ok(())
}

async fn show_report<P: ReportPipeline>(
    pipeline: P,
    args: &ViewArgs,
    range: DateRange,
    config: &AppConfig,
    cancel: &CancelToken,
) -> Result<()> {
    let engine = ReportEngine::new(pipeline, LocalStorage::new(config.output_path()));
    let mut view = ReportView::new(
        engine.pipeline().schema(),
        CellFormatter::new(config.timezone()),
        config.page_size(),
    );

    let ticket = view.begin_load();
    let rows = match cancel.run(engine.load(ticket.cancel_token())).await {
        Ok(rows) => rows,
        Err(e) => {
            view.abandon_load(&ticket);
            return Err(e);
        }
    };
    view.complete_load(&ticket, rows);

    if !args.columns.is_empty() {
        for key in &args.columns {
            if !view.columns().iter().any(|c| &c.key == key.trim()) {
                tracing::warn!("⚠️ Unknown column '{}' ignored", key);
            }
        }
        view.select_columns(&args.columns);
    }
    if let Some(query) = &args.search {
        view.set_query(query.as_str());
    }
    view.go_to_page(args.page);

    println!("{}", render_page(&view));

    if args.export {
        let request = view.export_request(chrono::Local::now().naive_local(), range);
        let path = engine
            .export(view.rows(), &view.active_columns(), &request)
            .await?;
        println!("📁 Exported to: {}", path);
    }

    Ok(())
}

async fn read_password() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    tokio::io::BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
