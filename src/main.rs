use anyhow::Result;
use clap::Parser;
use scatterscan::cli::{self, Cli};
use scatterscan::config::AppSettings;
use scatterscan::{logging, output};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = AppSettings::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);
    settings.validate()?;

    logging::init_logging(cli.verbose, cli.quiet, settings.log_file.as_deref())?;

    cli::execute(&cli, &settings).await?;
    Ok(())
}
