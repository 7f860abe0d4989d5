use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{self, PipelineOptions};
use crate::models::{PatientMetadata, Sex};

#[derive(Debug, Parser)]
#[command(
    name = "medreport",
    version,
    about = "Extract and classify clinical test results from report text"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze one report and print its JSON
    Analyze(AnalyzeArgs),
    /// Analyze a JSON array of `{ "text", "metadata" }` inputs in parallel
    Batch(BatchArgs),
    /// Validate the tables and print a summary
    Tables(TablesArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(Debug, Args)]
pub struct TablesDirArg {
    #[arg(
        long = "tables",
        env = config::TABLES_DIR_ENV,
        help = "Directory holding pattern_catalog.json / reference_ranges.json"
    )]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[arg(long, default_value_t = config::DEFAULT_ADJACENCY_WINDOW, help = "Max characters between a test name and its value")]
    pub window: usize,

    #[arg(long, default_value_t = config::DEFAULT_MAX_RESULTS, help = "Max results kept per report (0 = no limit)")]
    pub max_results: usize,

    #[arg(long, default_value_t = false)]
    pub no_ocr_correction: bool,

    #[arg(long, default_value_t = false)]
    pub no_patient_info: bool,
}

impl PipelineArgs {
    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            adjacency_window: self.window,
            ocr_correction: !self.no_ocr_correction,
            max_results: self.max_results,
            extract_patient_info: !self.no_patient_info,
        }
    }
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(help = "Report text file, or - for stdin")]
    pub file: PathBuf,

    #[arg(long, value_enum)]
    pub sex: Option<SexArg>,

    #[arg(long)]
    pub age: Option<u32>,

    #[command(flatten)]
    pub tables: TablesDirArg,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[arg(long, default_value_t = false, help = "Single-line JSON output")]
    pub compact: bool,
}

impl AnalyzeArgs {
    pub fn metadata(&self) -> PatientMetadata {
        PatientMetadata::new(self.sex.map(Sex::from).unwrap_or_default(), self.age)
    }
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(help = "JSON file with an array of report inputs, or - for stdin")]
    pub file: PathBuf,

    #[command(flatten)]
    pub tables: TablesDirArg,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Debug, Args)]
pub struct TablesArgs {
    #[command(flatten)]
    pub tables: TablesDirArg,

    #[arg(long, help = "Write the bundled tables as editable JSON into this directory")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_args_build_metadata_and_options() {
        let cli = Cli::try_parse_from([
            "medreport",
            "analyze",
            "report.txt",
            "--sex",
            "female",
            "--age",
            "34",
            "--window",
            "20",
            "--no-ocr-correction",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.metadata(), PatientMetadata::new(Sex::Female, Some(34)));
        let options = args.pipeline.options();
        assert_eq!(options.adjacency_window, 20);
        assert!(!options.ocr_correction);
        assert!(options.extract_patient_info);
        assert_eq!(options.max_results, config::DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn unknown_sex_rejected() {
        assert!(Cli::try_parse_from(["medreport", "analyze", "r.txt", "--sex", "x"]).is_err());
    }
}
