use clap::Parser;
use goodenough_config::Loader;
use goodenough_lsp::GoodEnoughLanguageServer;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "goodenough-lsp")]
#[command(about = "Good-enough Scala navigation over LSP on stdin/stdout")]
struct Args {
    /// TOML file layered over the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where file contents come from, overriding `indexing.file_source`
    #[arg(long, value_parser = ["client", "disk"])]
    file_source: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // stdout carries the protocol
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("goodenough=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut loader = Loader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    if let Some(source) = &args.file_source {
        loader = match loader.set_override("indexing.file_source", source.as_str()) {
            Ok(loader) => loader,
            Err(err) => {
                tracing::error!(error = %err, "invalid --file-source");
                return ExitCode::FAILURE;
            }
        };
    }
    let config = match loader.build() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(file_source = ?config.indexing.file_source, "starting goodenough-lsp");

    let (service, socket) =
        LspService::new(move |client| GoodEnoughLanguageServer::new(client, config));
    Server::new(stdin(), stdout(), socket).serve(service).await;
    ExitCode::SUCCESS
}
