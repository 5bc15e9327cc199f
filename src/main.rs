use clap::Parser;
use icoach::cli::{Args, build_settings, handle_issue_session, init_logging, load_secret};
use icoach::{ServerConfig, init_cleanup, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(access_secret) =
        load_secret("JWT_SECRET", args.jwt_secret_file.as_deref(), "--jwt-secret-file")
    else {
        std::process::exit(1);
    };

    let Some(refresh_secret) = load_secret(
        "JWT_REFRESH_SECRET",
        args.jwt_refresh_secret_file.as_deref(),
        "--jwt-refresh-secret-file",
    ) else {
        std::process::exit(1);
    };

    let Some(settings) = build_settings(&args, access_secret, refresh_secret) else {
        std::process::exit(1);
    };

    if let Some(subject_id) = args.issue_session.as_deref() {
        handle_issue_session(&settings, subject_id);
        return;
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read local address");
        std::process::exit(1);
    });

    info!(environment = ?settings.environment, "Auth settings loaded");
    let config = ServerConfig::new(settings);
    init_cleanup(&config.revocations);

    info!(address = %local_addr, "Listening");

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
