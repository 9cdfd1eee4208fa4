use clap::{Parser, ValueEnum};
use feasibility_report_lib::config::{AssemblyMode, ReportConfig};
use feasibility_report_lib::error::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Append,
    Enhance,
}

impl From<Mode> for AssemblyMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Append => AssemblyMode::Append,
            Mode::Enhance => AssemblyMode::Enhance,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "feasibility-report", version, about = "Build the feasibility report with its financial verification annex")]
struct Cli {
    /// JSON config file (defaults apply to anything it leaves out)
    #[arg(long)]
    config: Option<PathBuf>,

    /// append: annex only; enhance: annex, heading styles and cover page
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Workbook holding the statement sheet
    #[arg(long)]
    statement: Option<PathBuf>,

    /// Statement sheet name
    #[arg(long)]
    sheet: Option<String>,

    /// Template .docx (never modified)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output .docx
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_file(path)?,
            None => ReportConfig::default(),
        };
        config.apply_env()?;
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(p) = self.statement {
            config.statement.path = p;
        }
        if let Some(s) = self.sheet {
            config.statement.sheet = s;
        }
        if let Some(p) = self.template {
            config.template = p;
        }
        if let Some(p) = self.output {
            config.output = Some(p);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.into_config()?;
    let summary = feasibility_report_lib::run(&config)?;
    println!(
        "Document generated successfully: {}",
        summary.outcome.output.display()
    );
    Ok(())
}
