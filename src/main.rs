use std::process::ExitCode;

fn main() -> ExitCode {
    // Verbosity via RUST_LOG, e.g. `RUST_LOG=debug psyfit batch --csv data.csv`.
    env_logger::init();

    match psyfit::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
