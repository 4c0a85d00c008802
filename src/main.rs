use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use gemma_chat::backend::{ChatBackend, HttpBackend};
use gemma_chat::core::client::{ChatClient, build_app};
use gemma_chat::core::config::{CliOverrides, load_config, resolve};
use gemma_chat::core::message::Role;
use gemma_chat::core::state::OverlapPolicy;
use gemma_chat::tui;

#[derive(Parser)]
#[command(name = "gemma-chat", about = "Terminal chat client for a local Gemma backend")]
struct Args {
    /// Backend base URL (e.g. http://localhost:5000)
    #[arg(long)]
    base_url: Option<String>,

    /// What a submit does while a reply is pending
    #[arg(long, value_enum)]
    overlap: Option<OverlapPolicy>,

    /// Config file to use instead of ~/.gemma-chat/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check backend status and print the status label
    Status,
    /// Send one message and print the conversation
    Ask { message: String },
    /// Clear the backend conversation
    Clear,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let (file_config, config_source) = load_config(args.config.as_deref())?;
    let config = resolve(
        &file_config,
        CliOverrides {
            base_url: args.base_url.as_deref(),
            overlap_policy: args.overlap,
        },
    )?;

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&config.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!(
        "gemma-chat starting up against {} (overlap: {:?})",
        config.base_url,
        config.overlap_policy
    );
    // Config was loaded before the logger existed
    config_source.log();
    log::debug!("Resolved config: {:?}", config);

    let backend: Arc<dyn ChatBackend> =
        Arc::new(HttpBackend::new(&config.base_url, config.request_timeout)?);
    let app = build_app(&config);

    let Some(command) = args.command else {
        tui::run(app, backend)?;
        return Ok(ExitCode::SUCCESS);
    };

    let mut client = ChatClient::new(app, backend);
    let failed = match command {
        Command::Status => {
            client.check_status().await;
            println!("{}", client.app().status_text());
            client.app().status.is_offline()
        }
        Command::Ask { message } => {
            client.send_message(&message).await;
            print_bubbles(&client)
        }
        Command::Clear => {
            client.clear_chat().await;
            print_bubbles(&client)
        }
    };

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Prints every bubble; true when the last one is an error.
fn print_bubbles(client: &ChatClient) -> bool {
    let messages = &client.app().messages;
    for bubble in messages {
        println!("{}: {}", bubble.role.label(), bubble.plain_text());
    }
    messages.last().is_some_and(|b| b.role == Role::Error)
}
