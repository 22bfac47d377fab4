use std::process::ExitCode;

fn main() -> ExitCode {
    stayrate_cli::run()
}
