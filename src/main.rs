use wsgi_gateway::config::Config;
use wsgi_gateway::gateway::Application;
use wsgi_gateway::{apps, logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(app_name) = args.next() else {
        eprintln!(
            "Usage: wsgi_gateway <APP> [CONFIG]\nProvide an application name: one of {}",
            apps::NAMES.join(", ")
        );
        std::process::exit(2);
    };

    let cfg = match args.next() {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg.logging)?;

    let app = apps::lookup(&app_name).ok_or_else(|| {
        format!(
            "unknown application {app_name:?}; available: {}",
            apps::NAMES.join(", ")
        )
    })?;

    // One thread of control: connections are served strictly in sequence
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg, app))
}

async fn async_main(
    cfg: Config,
    app: Box<dyn Application>,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = server::bind_from_config(&cfg)?;
    logger::log_server_start(&server.local_addr(), &server.identity().name, app.name());

    tokio::select! {
        result = server.serve_forever(app.as_ref()) => result?,
        reason = shutdown_signal() => logger::log_shutdown(reason),
    }

    Ok(())
}

/// Resolves when the process is asked to stop
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => "SIGINT received",
                    _ = sigterm.recv() => "SIGTERM received",
                }
            }
            Err(e) => {
                logger::log_warning(&format!("Failed to install SIGTERM handler: {e}"));
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT received"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl-C received"
    }
}
