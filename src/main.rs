//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::process::ExitCode;

use bzcat::compression::decompress::decompress;
use bzcat::tools::cli::{bzopts_init, usage_exit_code};

use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout may be carrying the decompressed data.
    if let Err(e) = TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("bzcat: could not start logging: {}", e);
    }

    // Sets the real log level from -q / -v
    let options = match bzopts_init() {
        Ok(options) => options,
        Err(e) => {
            // clap formats help, version and usage errors itself
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };

    match decompress(&options) {
        Ok(()) => {
            info!("Done.");
            ExitCode::SUCCESS
        }
        // The failing file and check have already been logged
        Err(e) if e.is_data_error() => ExitCode::from(2),
        Err(_) => ExitCode::from(1),
    }
}
