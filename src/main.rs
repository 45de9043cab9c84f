use clap::Parser;
use pomodoro_notion_sync::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(message) = pomodoro_notion_sync::run(cli).await {
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}
