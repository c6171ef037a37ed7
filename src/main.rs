use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use mailcraft::composer::PartKind;
use mailcraft::{Config, Mailer, MessageConfig, SendIntent};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose a message and deliver it through the configured provider
    Send(MessageArgs),

    /// Compose a message and print the resolved parts without sending
    Preview {
        #[command(flatten)]
        message: MessageArgs,

        /// Print the composed message as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Recipient address
    #[arg(long)]
    to: String,

    #[arg(long, default_value = "")]
    subject: String,

    #[arg(long)]
    cc: Vec<String>,

    #[arg(long)]
    bcc: Vec<String>,

    /// Overrides the configured sender
    #[arg(long)]
    from: Option<String>,

    #[arg(long)]
    reply_to: Option<String>,

    #[arg(long, conflicts_with = "text_file")]
    text_body: Option<String>,

    /// Read the text body from a file
    #[arg(long)]
    text_file: Option<PathBuf>,

    #[arg(long, conflicts_with = "html_file")]
    html_body: Option<String>,

    /// Read the HTML body from a file
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Custom template for the text part, relative to the template directory
    #[arg(long)]
    text_template: Option<String>,

    /// Custom template for the HTML part, relative to the template directory
    #[arg(long)]
    html_template: Option<String>,

    /// Do not request a text part
    #[arg(long)]
    no_text: bool,

    /// Do not request an HTML part
    #[arg(long)]
    no_html: bool,

    /// Request only the parts that have a body or template
    #[arg(long, conflicts_with_all = ["no_text", "no_html"])]
    auto: bool,

    /// Extra template variable, as KEY=VALUE
    #[arg(long = "var", value_parser = parse_key_value)]
    vars: Vec<(String, String)>,

    /// File to attach, may be repeated
    #[arg(long = "attach")]
    attachments: Vec<PathBuf>,

    /// Extra header, as "Name: value"
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected \"Name: value\", got '{}'", raw)),
    }
}

impl MessageArgs {
    fn build(&self) -> Result<(MessageConfig, SendIntent), Box<dyn std::error::Error>> {
        let mut builder = MessageConfig::builder(self.to.as_str(), self.subject.as_str());

        let text_body = match (&self.text_body, &self.text_file) {
            (Some(body), _) => Some(body.clone()),
            (None, Some(path)) => Some(std::fs::read_to_string(path)?),
            (None, None) => None,
        };
        let html_body = match (&self.html_body, &self.html_file) {
            (Some(body), _) => Some(body.clone()),
            (None, Some(path)) => Some(std::fs::read_to_string(path)?),
            (None, None) => None,
        };

        if let Some(body) = text_body {
            builder = builder.text_body(body);
        }
        if let Some(body) = html_body {
            builder = builder.html_body(body);
        }
        if let Some(template) = &self.text_template {
            builder = builder.text_template(template.as_str());
        }
        if let Some(template) = &self.html_template {
            builder = builder.html_template(template.as_str());
        }
        for address in &self.cc {
            builder = builder.cc(address.as_str());
        }
        for address in &self.bcc {
            builder = builder.bcc(address.as_str());
        }
        if let Some(from) = &self.from {
            builder = builder.from_address(from.as_str());
        }
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.as_str());
        }
        for (key, value) in &self.vars {
            builder = builder.context(key.as_str(), value.as_str());
        }
        for path in &self.attachments {
            builder = builder.attachment(path.clone());
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let config = builder.build()?;
        let intent = if self.auto {
            SendIntent::from_sources(&config)
        } else {
            SendIntent::new(!self.no_text, !self.no_html)
        };

        Ok((config, intent))
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        Ok(Config::from_file(config_path)?)
    } else {
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    // Set up logging first
    let log_level = cli.log_level.as_deref().unwrap_or(&config.app.log_level);
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.config.exists() {
        info!("Configuration loaded from: {:?}", cli.config);
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
    }

    let mailer = Mailer::from_config(&config).await?;

    match cli.command {
        Commands::Send(args) => {
            let (message, intent) = args.build()?;
            let receipt = mailer.send(&message, intent).await?;
            println!(
                "Sent via {} (message id: {})",
                receipt.provider,
                receipt.message_id.as_deref().unwrap_or("-")
            );
        }
        Commands::Preview { message, json } => {
            let (message, intent) = message.build()?;
            let composed = mailer.compose(&message, intent)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&composed)?);
            } else {
                println!("Subject: {}", composed.subject);
                for (name, value) in message.headers() {
                    println!("{}: {}", name, value);
                }
                for path in message.attachments() {
                    println!("Attachment: {}", path.display());
                }
                for kind in [PartKind::Text, PartKind::Html] {
                    if let Some(part) = composed.part(kind) {
                        println!("\n--- {} ---\n{}", kind, part);
                    }
                }
            }
        }
    }

    Ok(())
}
