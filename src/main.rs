use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use gvadash::error_display::user_message_from_report;
use gvadash::{
    export_chart, Aggregator, AppConfig, Args, ChartFigure, ConfigManager, GvaTable, OutputFormat,
    APP_NAME,
};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// RUST_LOG wins over the configured level. The dashboard owns the terminal,
/// so without a log file it logs nothing; batch runs log to stderr.
fn init_logging(config: &AppConfig, batch: bool) -> Result<()> {
    let level = config.logging.level.as_deref().unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None if batch => builder.compact().with_writer(std::io::stderr).try_init(),
        None => return Ok(()),
    };
    result.map_err(|e| eyre!("Failed to initialise logging: {}", e))
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration file written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

/// Non-interactive outputs: print the matrix and/or write the chart, then exit.
fn run_batch(args: &Args, config: &AppConfig, aggregator: &Aggregator) -> Result<()> {
    let matrix = aggregator.compute_named(
        &config.display.default_grouping,
        config.display.default_indexed,
    )?;
    let figure = ChartFigure::from_matrix(&matrix);

    if args.print {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match args.format {
            OutputFormat::Csv => matrix.write_csv(&mut out)?,
            OutputFormat::Json => serde_json::to_writer_pretty(&mut out, &matrix)?,
            OutputFormat::Series => serde_json::to_writer_pretty(&mut out, &figure)?,
        }
        if args.format != OutputFormat::Csv {
            writeln!(out)?;
        }
    }

    if let Some(path) = &args.export_chart {
        export_chart(path, &figure, &config.export_options())?;
        eprintln!("Chart written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let mut config = match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.apply_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = init_logging(&config, args.is_batch()) {
        eprintln!("Warning: {}", e);
    }
    color_eyre::install()?;
    debug!(?args, "starting");

    let path = config.data.path.clone();
    let table = match GvaTable::load(&path, &config.load_options()) {
        Ok(table) => table,
        Err(e) => {
            let report = color_eyre::eyre::Report::new(e);
            eprintln!("Error: {}", user_message_from_report(&report, Some(&path)));
            std::process::exit(1);
        }
    };
    info!(path = %path.display(), rows = table.len(), "table ready");
    let aggregator = Aggregator::new(Arc::new(table));

    let result = if args.is_batch() {
        run_batch(&args, &config, &aggregator)
    } else {
        gvadash::run(aggregator, config)
    };
    if let Err(e) = result {
        eprintln!("Error: {}", user_message_from_report(&e, None));
        std::process::exit(1);
    }
    Ok(())
}
