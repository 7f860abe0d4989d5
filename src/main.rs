use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use medreport_lib::catalog::{export_bundled, load_tables};
use medreport_lib::cli::{Cli, Commands};
use medreport_lib::config;
use medreport_lib::pipeline::{ReportInput, ReportPipeline};

fn main() -> Result<()> {
    medreport_lib::init_tracing();

    let cli = Cli::parse();
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match cli.command {
        Commands::Analyze(args) => {
            let tables = load_tables(args.tables.dir.as_deref())
                .context("failed to load pattern catalog / reference table")?;
            let pipeline = ReportPipeline::from_tables(tables, args.pipeline.options());
            let text = read_input(&args.file)?;
            let report = pipeline.analyze(&text, &args.metadata());
            print_json(&report, args.compact)?;
        }
        Commands::Batch(args) => {
            let tables = load_tables(args.tables.dir.as_deref())
                .context("failed to load pattern catalog / reference table")?;
            let pipeline = ReportPipeline::from_tables(tables, args.pipeline.options());
            let raw = read_input(&args.file)?;
            let inputs: Vec<ReportInput> = serde_json::from_str(&raw)
                .with_context(|| format!("invalid batch input {}", args.file.display()))?;

            if args.threads > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(args.threads)
                    .build_global()
                    .context("failed to configure thread pool")?;
            }
            let reports = pipeline.analyze_batch(&inputs);
            print_json(&reports, args.compact)?;
        }
        Commands::Tables(args) => {
            if let Some(out) = &args.export {
                let written = export_bundled(out)
                    .with_context(|| format!("failed to export tables to {}", out.display()))?;
                for path in written {
                    println!("wrote {}", path.display());
                }
                return Ok(());
            }

            let tables = load_tables(args.tables.dir.as_deref())
                .context("failed to load pattern catalog / reference table")?;
            println!(
                "pattern catalog: {} rules ({})",
                tables.catalog.len(),
                tables.catalog_source
            );
            println!(
                "reference table: {} bands, {} conversions ({})",
                tables.reference.len(),
                tables.reference.conversions().len(),
                tables.reference_source
            );
        }
    }

    Ok(())
}

/// Reports are often OCR output; invalid UTF-8 is replaced, not rejected.
fn read_input(path: &Path) -> Result<String> {
    let bytes = if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}
