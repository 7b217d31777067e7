// src/main.rs

use mrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("mrun error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        // The aggregate of all targets becomes our own exit status.
        Ok(code) => std::process::exit(code),
        // A fault in the harness itself, not a target's exit code.
        Err(err) => {
            eprintln!("mrun error: {err:?}");
            std::process::exit(1);
        }
    }
}
