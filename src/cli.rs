// Command-line front end: `unpack` XNB files to JSON, `pack` JSON back.
//
// Either argument may be a single file or a directory. Directories are walked
// recursively and mirrored into the output tree; files with the wrong
// extension are skipped. A failing file is logged and counted, and the batch
// keeps going.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueHint};
use log::{error, info};

use crate::error::Result;
use crate::porter;
use crate::xnb::{self, UnpackOptions};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// XNB asset container unpacker/packer.
#[derive(Parser, Debug)]
#[command(
    name = "xnbkit",
    version,
    about = "Unpack XNB files to JSON and pack them back",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Enable debug logging.
    #[arg(short = 'v', long, global = true, conflicts_with = "errors")]
    debug: bool,

    /// Only print error messages.
    #[arg(long, global = true)]
    errors: bool,

    /// Print the success/fail tally as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Unpack .xnb files into .json documents.
    Unpack(UnpackArgs),
    /// Pack .json documents into .xnb files.
    Pack(PathArgs),
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Input file or directory.
    #[arg(value_hint = ValueHint::AnyPath)]
    input: PathBuf,

    /// Output file or directory (default: next to the input).
    #[arg(value_hint = ValueHint::AnyPath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UnpackArgs {
    #[command(flatten)]
    paths: PathArgs,

    /// Accept files whose length differs from the declared size.
    #[arg(long)]
    lenient: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Unpack { strict_size: bool },
    Pack,
}

impl Direction {
    fn name(self) -> &'static str {
        match self {
            Self::Unpack { .. } => "unpack",
            Self::Pack => "pack",
        }
    }

    fn input_ext(self) -> &'static str {
        match self {
            Self::Unpack { .. } => "xnb",
            Self::Pack => "json",
        }
    }

    fn output_ext(self) -> &'static str {
        match self {
            Self::Unpack { .. } => "json",
            Self::Pack => "xnb",
        }
    }

    fn accepts(self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.input_ext()))
    }

    fn process(self, input: &Path, output: &Path) -> Result<()> {
        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        match self {
            Self::Unpack { strict_size } => {
                let bytes = fs::read(input)?;
                let doc = xnb::unpack_with(&bytes, &UnpackOptions { strict_size })?;
                porter::export_file(output, &doc)
            }
            Self::Pack => {
                let doc = porter::import_file(input)?;
                fs::write(output, xnb::pack(&doc)?)?;
                Ok(())
            }
        }
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv = std::iter::once("xnbkit".to_string()).chain(args.iter().cloned());
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = log_level(&cli);
    }
}

// ---------------------------------------------------------------------------
// Batch processing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    success: usize,
    fail: usize,
}

impl Tally {
    fn run(&mut self, direction: Direction, input: &Path, output: &Path) {
        match direction.process(input, output) {
            Ok(()) => {
                info!("output file saved: {}", output.display());
                self.success += 1;
            }
            Err(e) => {
                error!("{}: {e}", input.display());
                self.fail += 1;
            }
        }
    }
}

/// Output path for a single input file.
fn single_output(direction: Direction, input: &Path, output: Option<&Path>) -> PathBuf {
    let renamed = input.with_extension(direction.output_ext());
    match output {
        None => renamed,
        Some(out) if out.is_dir() => match renamed.file_name() {
            Some(name) => out.join(name),
            None => out.to_path_buf(),
        },
        Some(out) => out.to_path_buf(),
    }
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());
    for entry in entries {
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn process_paths(direction: Direction, input: &Path, output: Option<&Path>) -> Result<Tally> {
    let mut tally = Tally::default();

    if !input.is_dir() {
        if direction.accepts(input) {
            tally.run(direction, input, &single_output(direction, input, output));
        }
        return Ok(tally);
    }

    let out_root = output.unwrap_or(input);
    let mut files = Vec::new();
    walk(input, &mut files)?;
    for file in files.iter().filter(|f| direction.accepts(f)) {
        let Ok(relative) = file.strip_prefix(input) else {
            continue;
        };
        let target = out_root.join(relative).with_extension(direction.output_ext());
        tally.run(direction, file, &target);
    }
    Ok(tally)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_level(cli: &Cli) -> &'static str {
    if cli.debug {
        "debug"
    } else if cli.errors {
        "error"
    } else {
        "warn"
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(&cli)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let (direction, paths) = match &cli.command {
        Cmd::Unpack(args) => (
            Direction::Unpack {
                strict_size: !args.lenient,
            },
            &args.paths,
        ),
        Cmd::Pack(args) => (Direction::Pack, args),
    };

    let tally = match process_paths(direction, &paths.input, paths.output.as_deref()) {
        Ok(tally) => tally,
        Err(e) => {
            eprintln!("xnbkit: {}: {e}", paths.input.display());
            process::exit(1);
        }
    };

    if !cli.errors {
        println!("Success {}", tally.success);
        println!("Fail {}", tally.fail);
    }

    if cli.json_output {
        let json = serde_json::json!({
            "command": direction.name(),
            "success": tally.success,
            "fail": tally.fail,
        });
        eprintln!("{json:#}");
    }

    process::exit(if tally.fail == 0 { 0 } else { 1 });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("xnbkit").chain(args.iter().copied());
        Cli::try_parse_from(argv).expect("cli parse failed")
    }

    #[test]
    fn unpack_subcommand_parses() {
        let cli = parse(&["unpack", "in.xnb", "out.json", "--lenient"]);
        let Cmd::Unpack(args) = cli.command else {
            panic!("expected unpack");
        };
        assert!(args.lenient);
        assert_eq!(args.paths.input, PathBuf::from("in.xnb"));
        assert_eq!(args.paths.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn output_is_optional() {
        let cli = parse(&["pack", "content"]);
        let Cmd::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert!(args.output.is_none());
    }

    #[test]
    fn log_flags_pick_the_filter() {
        assert_eq!(log_level(&parse(&["pack", "a"])), "warn");
        assert_eq!(log_level(&parse(&["--debug", "pack", "a"])), "debug");
        assert_eq!(log_level(&parse(&["pack", "a", "--errors"])), "error");
        assert!(Cli::try_parse_from(["xnbkit", "--debug", "--errors", "pack", "a"]).is_err());
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        let unpack = Direction::Unpack { strict_size: true };
        assert!(unpack.accepts(Path::new("Content/Maps/Town.XNB")));
        assert!(!unpack.accepts(Path::new("Content/readme.txt")));
        assert!(Direction::Pack.accepts(Path::new("a.json")));
    }

    #[test]
    fn single_file_output_swaps_extension() {
        let out = single_output(Direction::Pack, Path::new("dir/font.json"), None);
        assert_eq!(out, PathBuf::from("dir/font.xnb"));
        let out = single_output(Direction::Pack, Path::new("font.json"), Some(Path::new("x.xnb")));
        assert_eq!(out, PathBuf::from("x.xnb"));
    }

    #[test]
    fn directory_batch_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.xnb"), b"not an xnb").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        let tally = process_paths(Direction::Unpack { strict_size: true }, dir.path(), None).unwrap();
        assert_eq!(tally, Tally { success: 0, fail: 1 });
    }
}
