use anyhow::{bail, Result};
use chatstream_core::config::Config;
use chatstream_core::core_model::{Message, TypingState, TypingStateType, UserId};
use chatstream_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use chatstream_core::{ChatEvent, ChatSdk, InMemoryAdapter};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const EVENT_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "chatstream")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error), overriding the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// TOML configuration file; CHATSTREAM_* variables are applied on top
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run two in-process users exchanging messages and read receipts
    Demo {
        /// Number of messages alice sends to bob
        #[arg(short, long, default_value_t = 3)]
        messages: usize,

        /// Print received sendables as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env()?;
            config.validate()?;
            config
        }
        None => Config::from_env()?,
    };
    Ok(config)
}

fn log_config(args: &Args, config: &Config) -> Result<LogConfig> {
    let mut log_config = LogConfig::try_from(&config.logging)?;

    if let Some(level) = &args.log_level {
        let level = level.parse::<LogLevel>().unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', using 'info'", level);
            LogLevel::Info
        });
        log_config = LogConfig { level, ..log_config };
    }

    Ok(log_config.json_format(args.json_logs || config.logging.json_format))
}

async fn run_demo(config: Config, count: usize, json: bool) -> Result<()> {
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");

    let alice_session = InMemoryAdapter::new(alice.clone());
    let bob_session = alice_session.for_user(bob.clone());
    let alice_sdk = ChatSdk::initialize(config.clone(), Arc::new(alice_session))?;
    let bob_sdk = ChatSdk::initialize(config, Arc::new(bob_session))?;

    let alice_chat = alice_sdk.one_to_one_chat(alice.clone());
    let bob_chat = bob_sdk.one_to_one_chat(bob.clone());
    let mut alice_events = alice_chat.events().subscribe_all();
    let mut bob_events = bob_chat.events().subscribe_all();

    alice_chat.connect().await?;
    bob_chat.connect().await?;
    info!(alice = %alice_chat.state(), bob = %bob_chat.state(), "Chats connected");

    let to_bob = alice_chat.paths().outbound_path(&bob);
    alice_chat
        .send(&to_bob, TypingState::create(alice.clone(), TypingStateType::Typing))
        .await?;
    for n in 1..=count {
        let text = format!("message {} of {}", n, count);
        alice_chat.send(&to_bob, Message::with_text(alice.clone(), text)).await?;
    }

    let mut received = 0;
    while received < count {
        match timeout(EVENT_WAIT, bob_events.recv()).await?? {
            ChatEvent::Message(message) => {
                received += 1;
                if json {
                    println!("{}", serde_json::to_string(message.sendable())?);
                } else {
                    println!("bob   <- {}: {}", message.sender(), message.text().unwrap_or(""));
                }
                bob_chat.mark_read(&message).await?;
            }
            ChatEvent::TypingState(state) => {
                let kind = state.typing_state().map_or("unknown", |t| t.as_str());
                println!("bob   <- {}: {}", state.sender(), kind);
            }
            ChatEvent::Error(error) => bail!("bob's chat failed: {}", error),
            other => debug!(event = ?other, "Ignoring event"),
        }
    }

    let mut receipts = 0;
    while receipts < count {
        match timeout(EVENT_WAIT, alice_events.recv()).await?? {
            ChatEvent::DeliveryReceipt(receipt) => {
                receipts += 1;
                let kind = receipt.receipt_type().map_or("unknown", |t| t.as_str());
                let target = receipt.message_id().map(|id| id.to_string()).unwrap_or_default();
                println!("alice <- {} {} {}", receipt.sender(), kind, target);
            }
            ChatEvent::Error(error) => warn!(error = %error, "Alice's chat reported an error"),
            other => debug!(event = ?other, "Ignoring event"),
        }
    }

    info!(
        alice_logged = alice_chat.get_sendables().len(),
        bob_logged = bob_chat.get_sendables().len(),
        "Demo finished"
    );

    alice_chat.disconnect();
    bob_chat.disconnect();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    init_logging_with_config(log_config(&args, &config)?)?;

    info!("Chatstream CLI started");

    match args.command {
        Some(Command::Demo { messages, json }) => {
            run_demo(config, messages, json).await?;
        }
        Some(Command::Config) => {
            print!("{}", config.to_toml()?);
        }
        None => {
            info!("No command specified. Use --help for usage information.");
        }
    }

    info!("Chatstream CLI finished");

    Ok(())
}
