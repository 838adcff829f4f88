use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Generate the Market Survey Analysis Tool workbook.
#[derive(Parser)]
#[command(name = "msat", version, about)]
struct Args {
    /// Output path for the workbook.
    #[arg(default_value = "MarketSurvey.xlsx")]
    output: PathBuf,

    /// Leave the entry sheet blank instead of seeding the demonstration rows.
    #[arg(long)]
    no_sample_data: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match msat::generate_workbook(&args.output, !args.no_sample_data) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
