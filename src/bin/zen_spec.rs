use std::process::ExitCode;
use zen_validation::cli::run_cli;
use zen_validation::logging::init_logging;

fn main() -> ExitCode {
    if let Err(err) = init_logging() {
        eprintln!("warning: {err:#}");
    }
    match run_cli() {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(3)
        }
    }
}
