use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use csv_recorder::{LinePrompt, NoPrompt, Prompt};
use emg_sensor::create_hub;
use myo_recorder::{
    app,
    cli::{Cli, Command},
    config::load_config,
};

fn main() -> ExitCode {
    // Telemetry owns stdout, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myo_recorder=info,csv_recorder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = app::report_fatal(&e, !cli.no_pause, &mut io::stdin().lock(), &mut io::stderr());
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Command::Capture(args) = &cli.command {
        args.apply(&mut config);
    }

    let mut hub = create_hub(&config.hub)?;
    let mut prompt: Box<dyn Prompt> = if config.capture.prompt {
        Box::new(LinePrompt::new(io::stdin().lock(), io::stdout()))
    } else {
        Box::new(NoPrompt)
    };

    let mut stdout = io::stdout();
    let result = app::run(&cli.command, &config, hub.as_mut(), prompt.as_mut(), &mut stdout);
    let _ = stdout.flush();
    result
}
