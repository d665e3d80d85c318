use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command as Process, ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use walkdir::WalkDir;
use zeno_core::{CompileOptions, CoreError, FsResolver, Issue, compile_go, lint_file};

/// Zeno 言語のコンパイラ。Zeno のソースを Go に変換する。
#[derive(Parser, Debug)]
#[command(name = "zeno", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Also print Japanese diagnostics")]
    jp: bool,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace)"
    )]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a Zeno file to Go source
    Compile {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,
        #[arg(short, long, help = "Write Go source here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Compile and execute with `go run`
    Run { input: PathBuf },
    /// Compile and build a native binary with `go build`
    Build {
        input: PathBuf,
        #[arg(short, long, help = "Binary path (defaults to the input file stem)")]
        output: Option<PathBuf>,
    },
    /// Report unused symbols and naming problems
    Lint {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = LintFormat::Text)]
        format: LintFormat,
        #[arg(long, alias = "deny", help = "Exit with failure when any issue is found")]
        deny_warnings: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LintFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .init();
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let options = CompileOptions {
        emit_secondary_diagnostics: cli.jp,
    };
    match cli.command {
        Commands::Compile { input, output } => {
            let Some(go_source) = compile(input.as_deref(), &options)? else {
                return Ok(ExitCode::FAILURE);
            };
            match output {
                Some(path) => write_output(&path, go_source.as_bytes())?,
                None => print!("{go_source}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { input } => {
            let Some(go_source) = compile(Some(&input), &options)? else {
                return Ok(ExitCode::FAILURE);
            };
            let workdir = tempfile::tempdir().context("failed to create build directory")?;
            let main_go = workdir.path().join("main.go");
            write_output(&main_go, go_source.as_bytes())?;
            info!(path = %main_go.display(), "running generated program");
            run_go(Process::new("go").arg("run").arg(&main_go))
        }
        Commands::Build { input, output } => {
            let Some(go_source) = compile(Some(&input), &options)? else {
                return Ok(ExitCode::FAILURE);
            };
            let binary = output.unwrap_or_else(|| default_binary_path(&input));
            let binary = std::path::absolute(&binary)
                .with_context(|| format!("failed to resolve output path {}", binary.display()))?;
            let workdir = tempfile::tempdir().context("failed to create build directory")?;
            let main_go = workdir.path().join("main.go");
            write_output(&main_go, go_source.as_bytes())?;
            info!(binary = %binary.display(), "building native binary");
            run_go(
                Process::new("go")
                    .arg("build")
                    .arg("-o")
                    .arg(&binary)
                    .arg(&main_go),
            )
        }
        Commands::Lint {
            paths,
            format,
            deny_warnings,
        } => lint(&paths, format, deny_warnings, &options),
    }
}

/// Compile `input` (or stdin). Compiler errors are printed here and turn
/// into `None`; only I/O problems of the CLI itself are `Err`.
fn compile(input: Option<&Path>, options: &CompileOptions) -> Result<Option<String>> {
    let source = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };
    let display = input.map(|path| path.display().to_string());
    match compile_go(&source, input, &FsResolver) {
        Ok(artifact) => {
            debug!(modules = artifact.modules.len(), "compilation finished");
            Ok(Some(artifact.go_source))
        }
        Err(err) => {
            eprint!("{}", err.render(display.as_deref(), options));
            Ok(None)
        }
    }
}

fn lint(
    paths: &[PathBuf],
    format: LintFormat,
    deny_warnings: bool,
    options: &CompileOptions,
) -> Result<ExitCode> {
    let files = collect_sources(paths)?;
    let mut issues: Vec<Issue> = Vec::new();
    let mut failed = false;
    for file in &files {
        match lint_file(file) {
            Ok(mut found) => issues.append(&mut found),
            Err(CoreError::SourceIo(err)) => {
                return Err(err).with_context(|| format!("failed to read {}", file.display()));
            }
            Err(err) => {
                failed = true;
                eprint!("{}", err.render(Some(&file.display().to_string()), options));
            }
        }
    }

    match format {
        LintFormat::Text => {
            for issue in &issues {
                println!("{issue}");
            }
        }
        LintFormat::Json => {
            let json = serde_json::to_string_pretty(&issues).context("failed to serialize issues")?;
            println!("{json}");
        }
    }
    info!(files = files.len(), issues = issues.len(), "lint finished");

    if failed || (deny_warnings && !issues.is_empty()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Expand directories into their `.zeno` files, sorted; files given
/// explicitly are kept as is.
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path) {
                let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "zeno")
                {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn default_binary_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    input.with_file_name(stem)
}

fn run_go(command: &mut Process) -> Result<ExitCode> {
    let status = command
        .status()
        .context("failed to invoke the go toolchain; is `go` on PATH?")?;
    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
