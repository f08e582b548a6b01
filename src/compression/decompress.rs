use log::{error, info};

use crate::compression::stream::{StreamDecoder, StreamSummary};
use crate::error::Result;
use crate::tools::cli::{BzOpts, Mode, Output};

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Read, Write},
};

const SUFFIX: &str = ".bz2";

/// Decompress (or test) everything named in opts (BzOpts). Stops at the first file that fails,
/// after logging which one it was.
pub fn decompress(opts: &BzOpts) -> Result<()> {
    if opts.files.is_empty() {
        return decompress_stdin(opts).map_err(|e| {
            error!("(stdin): {}", e);
            e
        });
    }
    for name in &opts.files {
        if let Err(e) = decompress_file(name, opts) {
            error!("{}: {}", name, e);
            return Err(e);
        }
    }
    Ok(())
}

/// Name of the decompressed file: strip the .bz2 suffix, or tack on .out when there is none.
pub fn output_name(input: &str) -> String {
    match input.strip_suffix(SUFFIX) {
        Some(stem) if !stem.is_empty() && !stem.ends_with('/') => stem.to_string(),
        _ => format!("{}.out", input),
    }
}

fn decode<R: Read, W: Write>(input: R, sink: &mut W, opts: &BzOpts) -> Result<StreamSummary> {
    StreamDecoder::new(input)?
        .strict(opts.strict)
        .decode_to(sink)
}

fn decompress_stdin(opts: &BzOpts) -> Result<()> {
    let stdin = io::stdin();
    let input = stdin.lock();
    let summary = match opts.op_mode {
        Mode::Test => decode(input, &mut io::sink(), opts)?,
        Mode::Unzip => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            decode(input, &mut out, opts)?
        }
    };
    report("(stdin)", opts, &summary);
    Ok(())
}

fn decompress_file(name: &str, opts: &BzOpts) -> Result<()> {
    let input = File::open(name)?;

    let summary = match (opts.op_mode, opts.output) {
        (Mode::Test, _) => decode(input, &mut io::sink(), opts)?,
        (Mode::Unzip, Output::Stdout) => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            decode(input, &mut out, opts)?
        }
        (Mode::Unzip, Output::File) => {
            let out_name = output_name(name);
            let file = if opts.force_overwrite {
                File::create(&out_name)?
            } else {
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&out_name)
                    .map_err(|e| {
                        if e.kind() == io::ErrorKind::AlreadyExists {
                            io::Error::new(
                                e.kind(),
                                format!("output file {} already exists (use -f)", out_name),
                            )
                        } else {
                            e
                        }
                    })?
            };
            let mut out = BufWriter::new(file);
            match decode(input, &mut out, opts) {
                Ok(summary) => {
                    drop(out);
                    if !opts.keep_input_files {
                        fs::remove_file(name)?;
                    }
                    summary
                }
                Err(e) => {
                    // Never leave a half-written file behind
                    drop(out);
                    let _ = fs::remove_file(&out_name);
                    return Err(e);
                }
            }
        }
    };
    report(name, opts, &summary);
    Ok(())
}

fn report(name: &str, opts: &BzOpts, summary: &StreamSummary) {
    match opts.op_mode {
        Mode::Test => info!("{}: ok", name),
        Mode::Unzip => info!(
            "{}: done, {} blocks, {} bytes",
            name,
            summary.blocks.len(),
            summary.output_len
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const HELLO: &[u8] = include_bytes!("../../tests/fixtures/hello.bz2");

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("bzcat-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn output_names() {
        assert_eq!(output_name("notes.txt.bz2"), "notes.txt");
        assert_eq!(output_name("archive"), "archive.out");
        assert_eq!(output_name(".bz2"), ".bz2.out");
        assert_eq!(output_name("dir/.bz2"), "dir/.bz2.out");
    }

    #[test]
    fn file_is_decoded_and_input_removed() {
        let dir = scratch_dir("unzip");
        let input = dir.join("hello.txt.bz2");
        fs::write(&input, HELLO).unwrap();
        let mut opts = BzOpts::new();
        opts.files = vec![input.to_string_lossy().into_owned()];
        decompress(&opts).unwrap();
        assert_eq!(fs::read(dir.join("hello.txt")).unwrap(), b"hello\n".to_vec());
        assert!(!input.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn existing_output_needs_force() {
        let dir = scratch_dir("force");
        let input = dir.join("hello.bz2");
        fs::write(&input, HELLO).unwrap();
        fs::write(dir.join("hello"), b"old").unwrap();
        let mut opts = BzOpts::new();
        opts.files = vec![input.to_string_lossy().into_owned()];
        opts.keep_input_files = true;
        assert!(decompress(&opts).is_err());
        assert_eq!(fs::read(dir.join("hello")).unwrap(), b"old".to_vec());

        opts.force_overwrite = true;
        decompress(&opts).unwrap();
        assert_eq!(fs::read(dir.join("hello")).unwrap(), b"hello\n".to_vec());
        assert!(input.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_decode_keeps_input_and_removes_output() {
        let dir = scratch_dir("corrupt");
        let input = dir.join("bad.bz2");
        let mut data = HELLO.to_vec();
        data[10] ^= 1;
        fs::write(&input, &data).unwrap();
        let mut opts = BzOpts::new();
        opts.files = vec![input.to_string_lossy().into_owned()];
        let err = decompress(&opts).unwrap_err();
        assert!(err.is_data_error());
        assert!(input.exists());
        assert!(!dir.join("bad").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_mode_writes_nothing() {
        let dir = scratch_dir("test");
        let input = dir.join("hello.bz2");
        fs::write(&input, HELLO).unwrap();
        let mut opts = BzOpts::new();
        opts.files = vec![input.to_string_lossy().into_owned()];
        opts.op_mode = Mode::Test;
        decompress(&opts).unwrap();
        assert!(input.exists());
        assert!(!dir.join("hello").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let mut opts = BzOpts::new();
        opts.files = vec!["/nonexistent/bzcat/input.bz2".to_string()];
        assert!(!decompress(&opts).unwrap_err().is_data_error());
    }
}
