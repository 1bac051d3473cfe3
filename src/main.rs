use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ollaterm::core::config::Config;
use ollaterm::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "ollaterm")]
#[command(about = "A terminal chat interface for a local Ollama daemon")]
#[command(long_about = "Ollaterm is a full-screen terminal chat interface for a locally \
running Ollama daemon. Responses stream into the transcript as they are \
generated.\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Ctrl+P            Open the model picker\n\
  Ctrl+R            Open the role selector (Tab cycles)\n\
  Ctrl+L            Purge the conversation memory\n\
  Up/Down/Mouse     Scroll through the transcript\n\
  Ctrl+C            Quit")]
struct Args {
    /// Base URL of the Ollama daemon
    #[arg(long)]
    host: Option<String>,

    /// Model to chat with (defaults to the configured model)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging stays silent unless RUST_LOG asks for it; the alternate
    // screen owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });

    let host = args.host.unwrap_or_else(|| config.host().to_string());
    let model = args.model.unwrap_or_else(|| config.default_model().to_string());

    run_chat(host, model).await
}
