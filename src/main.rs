use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "taskchat")]
#[command(about = "Taskchat - run one collaboration-task chat session in the terminal", long_about = None)]
struct Cli {
    /// Task key from _config/config.yaml or the built-in presets
    task: Option<String>,

    /// List available task keys and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    taskchat::run(taskchat::RunOptions {
        task: cli.task,
        list: cli.list,
    })
    .await
}
