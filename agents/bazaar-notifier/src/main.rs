mod console;

use std::sync::Arc;

use bazaar_config::Settings;
use bazaar_services::{AuthUser, EngineDeps, LifecycleBinder, PageEvent};
use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console::{BellSoundSink, Command, HELP};

/// Live notification inbox for the Bazaar storefront.
#[derive(Parser, Debug)]
#[command(name = "bazaar-notifier", version, about)]
struct Cli {
    /// API access token.
    #[arg(long, env = "BAZAAR_TOKEN", hide_env_values = true)]
    token: String,

    /// Id of the signed-in user, for logging.
    #[arg(long, default_value = "me")]
    user: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "bazaar_notifier=info,bazaar_services=info,bazaar_db=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(api = %settings.api.base_url, push = %settings.api.ws_url, "Starting notifier");

    let deps = EngineDeps::from_settings(settings, Arc::new(BellSoundSink))?;
    let mut binder = LifecycleBinder::new(deps);
    let engine = binder.logged_in(AuthUser {
        id: cli.user,
        token: cli.token,
    })
    .await;
    let renderer = tokio::spawn(console::render(engine.presenter().subscribe(), engine.events()));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Logout) => {
                        binder.logged_out().await;
                        println!("signed out");
                        break;
                    }
                    Ok(command) => execute(&binder, command).await,
                    Err(message) => eprintln!("{message} (try `help`)"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    binder.shutdown().await;
    let _ = renderer.await;
    Ok(())
}

async fn execute(binder: &LifecycleBinder, command: Command) {
    let Some(engine) = binder.engine() else {
        eprintln!("not signed in");
        return;
    };

    let result = match command {
        Command::List => {
            print!("{}", console::render_inbox(&engine.snapshot(), Utc::now()));
            Ok(())
        }
        Command::Read(id) => engine.mark_read(&id).await,
        Command::ReadAll => engine.mark_all_read().await,
        Command::Delete(id) => engine.delete(&id).await,
        Command::More(page) => engine.load_page(page).await.map(|count| {
            println!("loaded {count} older notifications");
        }),
        Command::Hide => {
            engine.page_event(PageEvent::Hidden);
            Ok(())
        }
        Command::Show => {
            engine.page_event(PageEvent::Visible);
            Ok(())
        }
        Command::Focus => {
            engine.page_event(PageEvent::Focused);
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Logout | Command::Quit => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("failed: {e}");
    }
}
