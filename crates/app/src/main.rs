// CLI modules
mod args;
mod op;
mod ops;

// Report plumbing
mod cache;
mod config;
mod directory;
mod logging;
mod render;
mod upload;
mod version;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Check, Report, Version};

command_enum! {
    (Check, Check),
    (Report, Report),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Guards flush buffered logs when dropped, so they must outlive `run`
    let guards = logging::init_logging(args.debug, args.log_dir.as_deref());
    let code = run(args).await;
    drop(guards);

    std::process::exit(code);
}

async fn run(args: Args) -> i32 {
    let ctx = match op::OpContext::load(args.config_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {}", e);
            return 1;
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!("{:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    }
}
