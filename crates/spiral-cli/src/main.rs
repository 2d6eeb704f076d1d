//! spiral CLI - slicer post-processing script
//!
//! Rewrites sliced G-code in place: bridges single-extrusion layers,
//! turns runs of them into a continuous spiral, and aligns their seams.

use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spiral_gcode::{Document, GcodeError, Markers, SlicerFlavor};
use spiral_post::Operation;
use tracing_subscriber::EnvFilter;

mod config;

use config::SettingsArgs;

#[derive(Parser)]
#[command(name = "spiral")]
#[command(
    about = "Vase-mode and layer-bridging post-processor for sliced G-code",
    long_about = None
)]
struct Cli {
    /// Log debug details of every connection and alignment
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write the log to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post-process a G-code file
    Process {
        /// G-code file produced by the slicer
        file: PathBuf,
        /// Operation to apply (connect, vase, aligned-vase); asked for when omitted
        #[arg(short, long)]
        mode: Option<Operation>,
        /// Output file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Display per-layer information about a G-code file
    Info {
        /// G-code file produced by the slicer
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Slicer that produced the file (orca, prusa)
        #[arg(long)]
        flavor: Option<SlicerFlavor>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Process {
            file,
            mode,
            output,
            settings,
        } => {
            let operation = match mode {
                Some(op) => op,
                None => prompt_operation()?,
            };
            process_file(&file, output.as_deref(), operation, &settings)?;
        }
        Commands::Info { file, json, flavor } => {
            show_info(&file, json, flavor.unwrap_or_default())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn prompt_operation() -> Result<Operation> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Mode (connect, vase, aligned-vase): ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no mode given");
        }
        match line.parse() {
            Ok(op) => return Ok(op),
            Err(e) => println!("{e}"),
        }
    }
}

fn process_file(
    input: &Path,
    output: Option<&Path>,
    operation: Operation,
    args: &SettingsArgs,
) -> Result<()> {
    let settings = args.load()?;
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let (lines, trailing_newline) = split_text(&text);

    let mut doc = load_document(&lines, &settings.markers)?;
    tracing::info!(
        file = %input.display(),
        lines = lines.len(),
        layers = doc.layers().len(),
        "loaded"
    );
    tracing::debug!("layers before {operation}:\n{}", doc.summary());

    let report = spiral_post::run(&mut doc, operation, &settings)?;
    tracing::info!(%report, "done");

    let output = output.unwrap_or(input);
    fs::write(output, join_lines(&doc.reassemble(), trailing_newline))
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(file = %output.display(), "written");
    Ok(())
}

fn show_info(path: &Path, json: bool, flavor: SlicerFlavor) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let (lines, _) = split_text(&text);
    let doc = load_document(&lines, &flavor.markers())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc.layer_infos())?);
        return Ok(());
    }

    let single = doc
        .layers()
        .iter()
        .filter(|l| l.is_single_extrusion())
        .count();
    println!("File: {}", path.display());
    println!("Lines: {}", doc.line_count());
    println!("Layers: {} ({} single extrusion)", doc.layers().len(), single);
    if !doc.layers().is_empty() {
        println!("{}", doc.summary());
    }
    Ok(())
}

/// Split into layers, or keep the file as one block when it has none.
fn load_document(lines: &[&str], markers: &Markers) -> Result<Document> {
    match Document::split(lines, markers) {
        Ok(doc) => Ok(doc),
        Err(e @ GcodeError::NoLayerMarkers(_)) => {
            tracing::warn!("{e}; leaving file unchanged");
            Ok(Document::unlayered(lines))
        }
        Err(e) => Err(e.into()),
    }
}

fn split_text(text: &str) -> (Vec<&str>, bool) {
    (text.lines().collect(), text.ends_with('\n'))
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut text = lines.join("\n");
    if trailing_newline {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_newline_preserved() {
        for text in ["G28\nG1 X1 Y1 E1\n", "G28\nG1 X1 Y1 E1"] {
            let (lines, trailing) = split_text(text);
            let owned: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
            assert_eq!(join_lines(&owned, trailing), text);
        }
    }

    #[test]
    fn test_unlayered_fallback() {
        let lines = ["G28", "G1 X1 Y1 E1", "M84"];
        let doc = load_document(&lines, &Markers::default()).unwrap();
        assert!(doc.layers().is_empty());
        assert_eq!(doc.reassemble(), lines);
    }

    #[test]
    fn test_cli_parses_process() {
        let cli = Cli::try_parse_from([
            "spiral",
            "process",
            "part.gcode",
            "--mode",
            "aligned-vase",
            "--flavor",
            "prusa",
            "--transition-layers",
            "2",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Process { mode, settings, .. } = cli.command else {
            panic!("expected process command");
        };
        assert_eq!(mode, Some(Operation::AlignedVase));
        assert_eq!(settings.flavor, Some(SlicerFlavor::Prusa));
        assert_eq!(settings.transition_layers, Some(2));
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["spiral", "process", "a.gcode", "--mode", "spin"]).is_err());
    }
}
