mod cli;
mod commands;
mod formatting;
mod progress;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_generate, run_import_command};
use figcui_lib::observability::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Generate {
            input,
            output_dir,
            endpoint,
            api_token,
            scale,
            author,
            asset_mode,
            format,
            output,
        } => {
            run_generate(
                args.config,
                args.verbose,
                input,
                output_dir,
                endpoint,
                api_token,
                scale,
                author,
                asset_mode.map(Into::into),
                format,
                output,
            )
            .await
        }
        Commands::Import {
            input,
            output,
            format,
        } => run_import_command(args.config, args.verbose, input, output, format).await,
    }
}
