//! corpus-validator binary

use clap::Parser;

use corpus_validator::cli::{run_cli, Args};
use corpus_validator::logging;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init(args.json_logs, args.verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let exit_code = run_cli(args).await;
    std::process::exit(exit_code);
}
