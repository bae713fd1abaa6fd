//! pdfmerge - Stage, reorder and merge PDF files into a single document.

use clap::Parser;
use std::io;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfmerge::PdfMergeError;
use pdfmerge::app::App;
use pdfmerge::cli::Cli;
use pdfmerge::output::display_add_outcome;
use pdfmerge::shell::{Shell, prompt_yes_no};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfmerge=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        if err.is_merge_failure() {
            eprintln!("{}", err.alert());
        } else {
            eprintln!("Error: {err}");
        }
        process::exit(err.exit_code());
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), PdfMergeError> {
    cli.validate()?;
    let config = cli.to_config()?;
    tracing::debug!(?config, "starting");

    let mut app = App::new(config);

    if !cli.inputs.is_empty() {
        let outcome = app.add_paths(&cli.inputs).await?;
        display_add_outcome(app.formatter(), &outcome);
    }

    if cli.interactive {
        let mut shell = Shell::new(app, io::stdin().lock());
        return shell.run().await;
    }

    let formatter = app.formatter().clone();
    if formatter.should_print() && !app.config().json {
        formatter.info(&format!(
            "Merging {} file(s) into {}",
            app.workspace().list().len(),
            app.output_path().display()
        ));
    }

    let mut stdin = io::stdin().lock();
    let mut confirm = |prompt: &str| prompt_yes_no(&formatter, &mut stdin, prompt);
    let outcome = app.merge_to_disk(&mut confirm).await?;
    app.report(&outcome)
}
