use clap::{ErrorKind, Parser};
use log::{debug, LevelFilter};
use std::{fmt::Display, fmt::Formatter};

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Errors,
    Warnings,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// Log level that matches this verbosity.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Off,
            Verbosity::Errors => LevelFilter::Error,
            Verbosity::Warnings => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

/// Unzip, Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct BzOpts {
    /// Vec of names of files to read for input (empty means stdin)
    pub files: Vec<String>,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Treat a stream CRC mismatch as an error rather than a warning
    pub strict: bool,
    /// Verbosity of user information
    pub verbose: Verbosity,
}

impl BzOpts {
    pub fn new() -> Self {
        Self {
            files: vec![],
            force_overwrite: false,
            keep_input_files: false,
            op_mode: Mode::Unzip,
            output: Output::File,
            strict: false,
            verbose: Verbosity::Warnings,
        }
    }

    /// Put command line information from CLAP into our internal structure.
    pub fn from_args(args: Args) -> Self {
        let mut opts = Self::new();
        opts.files = args.files;
        opts.force_overwrite = args.force;
        opts.keep_input_files = args.keep;
        opts.strict = args.strict;
        if args.test {
            opts.op_mode = Mode::Test
        };
        if args.stdout {
            opts.output = Output::Stdout
        };
        opts.verbose = match (args.quiet, args.verbose) {
            (0, 0) => Verbosity::Warnings,
            (1, _) => Verbosity::Errors,
            (q, _) if q > 1 => Verbosity::Quiet,
            (_, 1) => Verbosity::Info,
            (_, 2) => Verbosity::Debug,
            _ => Verbosity::Trace,
        };
        opts
    }
}

impl Default for BzOpts {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the command line, set the log level, and return the options.
///
/// Help, version and usage errors come back as the clap error, to be printed by the caller
/// with [`usage_exit_code`] as the exit status.
pub fn bzopts_init() -> Result<BzOpts, clap::Error> {
    let opts = BzOpts::from_args(Args::try_parse()?);
    log::set_max_level(opts.verbose.level_filter());

    // Below we report initialization status to the user
    debug!("---- bzcat initialization ----");
    debug!("Mode: {}, output: {}", opts.op_mode, opts.output);
    debug!(
        "Force: {}, keep: {}, strict: {}",
        opts.force_overwrite, opts.keep_input_files, opts.strict
    );
    debug!("Files: {:?}", opts.files);
    Ok(opts)
}

/// Exit status for a command line clap refused: 0 for --help and --version, 1 otherwise.
/// (2 is kept for corrupt data.)
pub fn usage_exit_code(e: &clap::Error) -> u8 {
    match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "Decompress bzip2 files",
    long_about = "
    Decompresses bzip2 streams: canonical Huffman decoding, MTF/RLE2 expansion, inverse
    Burrows-Wheeler transform and RLE1 expansion, checking every block CRC and the stream CRC.

    With no files, reads stdin and writes stdout."
)]
pub struct Args {
    /// Files to decompress
    #[clap()]
    files: Vec<String>,

    /// Send output to stdout
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test")]
    test: bool,

    /// Force overwriting output file
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Keep input files
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Suppress warnings (-qq suppresses errors too)
    #[clap(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    quiet: u8,

    /// More diagnostics: -v block CRCs, -vv header fields, -vvv every stage
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Fail on a stream CRC mismatch instead of warning
    #[clap(long = "strict")]
    strict: bool,
}
