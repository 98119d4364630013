mod args;
mod commands;

use std::io::Write;
use std::time::Duration;

use chatbox::{
    ApiKey, ChatSessions, CompletionProvider, HttpClientConfig, OpenAiClient, OpenAiConfig,
    UpdateState, aggregate,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use args::Args;
use commands::{Command, HELP};

struct App<P> {
    provider: P,
    sessions: ChatSessions,
    streaming: bool,
}

impl<P: CompletionProvider> App<P> {
    async fn ask(&mut self, query: String) {
        self.sessions.user_say(query.as_str());

        if !self.streaming {
            let (text, references) = self.provider.chat(&query).await.into_parts();
            println!("{text}");
            print_references(&references.join("\n\n"));
            self.sessions.ai_say(text);
            return;
        }

        self.sessions.ai_say("");
        let stream = match self.provider.chat_stream(&query).await {
            Ok(stream) => stream,
            Err(e) => {
                self.record_failure(&e);
                return;
            }
        };

        let mut printed = 0;
        let result = aggregate(stream, |snapshot| match snapshot.state {
            UpdateState::InProgress => {
                print!("{}", &snapshot.text[printed..]);
                printed = snapshot.text.len();
                if let Err(e) = std::io::stdout().flush() {
                    tracing::debug!(error = %e, "Failed to flush stdout");
                }
            }
            UpdateState::Complete => println!(),
        })
        .await;

        match result {
            Ok(snapshot) => {
                print_references(&snapshot.references);
                if let Err(e) = self.sessions.update_last(snapshot.text) {
                    tracing::error!(error = %e, "Could not store answer");
                }
            }
            Err(e) => {
                if printed > 0 {
                    println!();
                }
                self.record_failure(&e);
            }
        }
    }

    fn record_failure(&mut self, error: &chatbox::LlmError) {
        tracing::debug!(error = ?error, "Streaming request failed");
        let text = format!("⚠️ {error}");
        eprintln!("{text}");
        if let Err(e) = self.sessions.update_last(text) {
            tracing::error!(error = %e, "Could not store failure");
        }
    }

    async fn run(&mut self, command: Command) -> Result<bool, Box<dyn std::error::Error>> {
        match command {
            Command::Ask(query) => self.ask(query).await,
            Command::Stream(on) => {
                self.streaming = on;
                println!("streaming {}", if on { "on" } else { "off" });
            }
            Command::Chat(name) => {
                self.sessions.use_chat_name(&name);
                println!("conversation: {name}");
            }
            Command::Export(path) => {
                tokio::fs::write(&path, self.sessions.to_json()?).await?;
                println!("exported to {}", path.display());
            }
            Command::ExportMarkdown(path) => {
                tokio::fs::write(&path, self.sessions.to_markdown()).await?;
                println!("exported to {}", path.display());
            }
            Command::Load(path) => {
                let json = tokio::fs::read_to_string(&path).await?;
                self.sessions = ChatSessions::from_json(&json)?;
                println!(
                    "loaded {} message(s) into '{}'",
                    self.sessions.history().len(),
                    self.sessions.current_name()
                );
            }
            Command::Clear => self.sessions.clear(),
            Command::History => {
                for message in self.sessions.history().messages() {
                    println!("[{}] {}", message.role, message.content);
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
            Command::Empty => {}
            Command::Invalid(line) => eprintln!("unknown command: {line} (try /help)"),
        }
        Ok(true)
    }
}

fn print_references(references: &str) {
    if !references.is_empty() {
        println!("\n{references}");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();

    let api_key = match args.secrets_file {
        Some(path) => ApiKey::FromSecretsFile(path),
        None => ApiKey::Default,
    };
    let config = OpenAiConfig::new(api_key)
        .with_model(args.model)
        .with_base_url(args.base_url)
        .with_http_config(HttpClientConfig {
            timeout: Duration::from_secs(args.timeout_secs),
        });
    if config.credential.is_none() {
        tracing::warn!("No API key found; requests will report it until one is configured");
    }

    let mut app = App {
        provider: OpenAiClient::new(config)?,
        sessions: ChatSessions::new(&args.chat),
        streaming: args.stream,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match app.run(Command::parse(&line)).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
