use anyhow::{Context, Result};
use std::io;
use std::sync::Arc;

use mindful_cascade::session::{self, Session};
use mindful_cascade::settings::{Mode, Settings};
use mindful_cascade::{load_cascade, server};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("Failed to load settings")?;

    let paths = settings.models.paths();
    let missing = paths.missing();
    if !missing.is_empty() {
        for path in &missing {
            log::error!("Model artifact {:?} not found.", path);
        }
        log::error!("Please train the models first.");
        return Err(anyhow::anyhow!("Model files not found."));
    }

    let cascade = Arc::new(load_cascade(&settings).context("Failed to initialize the cascade")?);
    log::info!("All models loaded successfully!");

    match settings.session.mode {
        Mode::Repl => {
            let mut session = Session::new(cascade);
            let stdin = io::stdin();
            session::run_repl(
                &mut session,
                stdin.lock(),
                io::stdout(),
                &settings.session.exit_token,
            )
        }
        Mode::Server => {
            let host = settings.server.host.clone();
            let port = settings.server.port;
            actix_web::rt::System::new()
                .block_on(server::run(cascade, &host, port))
                .context("Server failed")
        }
    }
}
