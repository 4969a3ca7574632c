#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for reading disposable mailboxes and extracting verification
//! codes

use clap::{Parser, Subcommand};
use std::time::Duration;
use tempmail_client::{
    BackendConfig, Inbox, Message, TempMailClient, extract_code, looks_like_html,
    strip_tags,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempmail-cli")]
#[command(
    about = "Read disposable mailboxes and extract verification codes"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List messages in a mailbox
    List {
        /// Mailbox address (must be on an allowed domain)
        address: String,
    },

    /// Show a single message by its position in the list
    Show {
        /// Mailbox address
        address: String,

        /// 1-based position in the list
        position: usize,
    },

    /// Print the first verification code found in a mailbox
    Code {
        /// Mailbox address
        address: String,

        /// Keep polling until a code arrives
        #[arg(long)]
        watch: bool,

        /// Give up after this many seconds when watching
        #[arg(long, default_value = "120")]
        timeout: u64,
    },

    /// List the domains this client accepts
    Domains,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = BackendConfig::from_env()?;
    let client = TempMailClient::new(config)?;

    match &args.command {
        Command::List { address } => {
            cmd_list(&client, &args, address).await?;
        }
        Command::Show { address, position } => {
            cmd_show(&client, &args, address, *position).await?;
        }
        Command::Code {
            address,
            watch,
            timeout,
        } => {
            cmd_code(&client, &args, address, *watch, *timeout).await?;
        }
        Command::Domains => {
            cmd_domains(&client, &args);
        }
    }

    Ok(())
}

async fn cmd_list(
    client: &TempMailClient,
    args: &Args,
    address: &str,
) -> anyhow::Result<()> {
    let address = client.parse_address(address)?;
    let inbox = client.fetch_inbox(&address).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inbox)?);
    } else {
        print_inbox_table(&inbox);
    }

    Ok(())
}

async fn cmd_show(
    client: &TempMailClient,
    args: &Args,
    address: &str,
    position: usize,
) -> anyhow::Result<()> {
    let address = client.parse_address(address)?;
    let inbox = client.fetch_inbox(&address).await?;

    let index = position
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("positions start at 1"))?;
    let message = inbox.messages.get(index).cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "no message at position {position} ({} in mailbox)",
            inbox.len()
        )
    })?;

    let message = client.open_message(&address, message).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        print_message_detail(&message);
    }

    Ok(())
}

async fn cmd_code(
    client: &TempMailClient,
    args: &Args,
    address: &str,
    watch: bool,
    timeout: u64,
) -> anyhow::Result<()> {
    let address = client.parse_address(address)?;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout);

    loop {
        let inbox = client.fetch_inbox(&address).await?;
        if let Some((message, code)) = first_code(&inbox) {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "code": code,
                        "subject": message.display_subject(),
                        "from": message.from_email.clone(),
                    })
                );
            } else {
                println!("{code}");
            }
            return Ok(());
        }

        if !watch {
            anyhow::bail!("no verification code found in {address}");
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("no verification code arrived within {timeout}s");
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

fn cmd_domains(client: &TempMailClient, args: &Args) {
    let config = client.config();

    if args.json {
        let entries: Vec<_> = config
            .allowed_domains
            .iter()
            .map(|domain| {
                serde_json::json!({
                    "domain": domain,
                    "managed": config.managed_domains.contains(domain),
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(entries));
    } else {
        for domain in &config.allowed_domains {
            if config.managed_domains.contains(domain) {
                println!("{domain} (managed)");
            } else {
                println!("{domain}");
            }
        }
    }
}

/// First code across the inbox, scanning each message's subject then
/// body.
fn first_code(inbox: &Inbox) -> Option<(&Message, String)> {
    inbox
        .messages
        .iter()
        .find_map(|message| extract_code(message).map(|code| (message, code)))
}

fn print_inbox_table(inbox: &Inbox) {
    if inbox.is_empty() {
        println!("No emails found.");
        return;
    }

    let header = format!(
        "{:<4} {:<17} {:<28} {:<10} {}",
        "#", "Date", "From", "Code", "Subject"
    );
    println!("{header}");
    println!("{}", "-".repeat(100));

    for (index, message) in inbox.messages.iter().enumerate() {
        let date = message
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let code = extract_code(message).unwrap_or_default();
        println!(
            "{:<4} {:<17} {:<28} {:<10} {}",
            index + 1,
            date,
            truncate(&message.from_email, 26),
            code,
            truncate(message.display_subject(), 40),
        );
    }

    println!("\n{} email(s), {} unread", inbox.len(), inbox.unread);
}

fn print_message_detail(message: &Message) {
    println!("From:    {} <{}>", message.from_name, message.from_email);
    println!("Subject: {}", message.display_subject());
    println!(
        "Date:    {}",
        message
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    );

    if let Some(code) = extract_code(message) {
        println!("Code:    {code}");
    }

    println!("\n--- Body ---\n");
    match message.body.as_deref() {
        Some(body) if looks_like_html(body) => println!("{}", strip_tags(body)),
        Some(body) => println!("{body}"),
        None => println!("(no body)"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String =
            s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
