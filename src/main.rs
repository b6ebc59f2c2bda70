use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use prooftally::core::model::Batch;
use prooftally::extract::normalize::JoinSeparator;
use prooftally::ocr::{self, OcrEngine};
use prooftally::pipeline::{export_batch, process_batch, PipelineConfig, SourceImage};

#[derive(Parser, Debug)]
#[command(name = "prooftally")]
#[command(version, about = "Vote-proof screenshot OCR extraction and tally aggregation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, deduplicate and tally a set of vote-proof screenshots
    Run {
        /// Input image files (jpg, jpeg, png)
        inputs: Vec<PathBuf>,

        /// Output directory (default: ./tally_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// OCR languages passed to the bridge
        #[arg(long, default_value = "ja,en")]
        lang: String,

        /// Separator used when joining OCR fragments
        #[arg(long, value_enum, default_value = "newline")]
        separator: Separator,

        /// Disable progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// OCR a single image and print the raw fragments
    Inspect {
        /// Input image file
        input: PathBuf,

        /// OCR languages passed to the bridge
        #[arg(long, default_value = "ja,en")]
        lang: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Separator {
    Space,
    Newline,
}

impl From<Separator> for JoinSeparator {
    fn from(value: Separator) -> Self {
        match value {
            Separator::Space => JoinSeparator::Space,
            Separator::Newline => JoinSeparator::Newline,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            inputs,
            output,
            lang,
            separator,
            quiet,
        } => run_batch(inputs, output, lang, separator.into(), quiet),
        Commands::Inspect { input, lang } => inspect_image(input, lang),
    }
}

fn run_batch(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    lang: String,
    separator: JoinSeparator,
    quiet: bool,
) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let output_dir = output.unwrap_or_else(|| PathBuf::from("tally_output"));
    let mut config = PipelineConfig::new(output_dir);
    config.lang = lang;
    config.separator = separator;

    let images = acquire_images(&inputs)?;
    if images.is_empty() {
        anyhow::bail!("None of the input files could be read");
    }

    // Engine unavailability is fatal before any image is touched.
    let engine = ocr::shared_engine(config.output.join("ocr"), &config.lang)
        .context("OCR engine failed to initialize")?;

    if !quiet {
        println!("[*] Processing {} image(s)", images.len());
        println!("[*] Output: {}", config.output.display());
    }

    let batch = process_batch(engine, &images, config.separator);

    export_batch(&batch, &config.output)
        .with_context(|| format!("Failed to export to: {}", config.output.display()))?;

    if !quiet {
        print_diagnostics(&batch);
        print_summary(&batch);
        println!("\n[✓] Done! Results saved to: {}", config.output.display());
    }

    Ok(())
}

fn acquire_images(inputs: &[PathBuf]) -> Result<Vec<SourceImage>> {
    let mut images = Vec::with_capacity(inputs.len());
    for input in inputs {
        if !input.is_file() {
            eprintln!("  [!] Skipped (not a file): {}", input.display());
            continue;
        }
        let source_id = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        match fs::read(input) {
            Ok(bytes) => images.push(SourceImage::new(source_id, bytes)),
            Err(err) => eprintln!("  [!] Skipped ({err}): {}", input.display()),
        }
    }
    Ok(images)
}

fn print_diagnostics(batch: &Batch) {
    println!("\nRecords");
    println!("=======");
    for record in &batch.records {
        let marker = match record.status {
            prooftally::RecordStatus::Ok => "[✓]",
            prooftally::RecordStatus::Partial => "[~]",
            prooftally::RecordStatus::Error => "[✗]",
        };
        println!(
            "{} {} account={} proof_id={} votes={} date={}",
            marker,
            record.source_id,
            record.account.as_deref().unwrap_or("-"),
            record.proof_id.as_deref().unwrap_or("-"),
            record
                .vote_count
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.date.as_deref().unwrap_or("-"),
        );
        if let Some(error) = &record.error {
            println!("      {error}");
        }
    }
}

fn print_summary(batch: &Batch) {
    println!("\nAccount totals");
    println!("==============");
    for row in &batch.summary {
        println!(
            "{:<28} {:>10}",
            row.account.as_deref().unwrap_or("(no account)"),
            row.total_votes
        );
    }
    println!("{:<28} {:>10}", "TOTAL", batch.grand_total);
}

fn inspect_image(input: PathBuf, lang: String) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let bytes = fs::read(&input).with_context(|| format!("Failed to read: {}", input.display()))?;
    let source_id = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let engine = ocr::shared_engine(std::env::temp_dir().join("prooftally-inspect"), &lang)
        .context("OCR engine failed to initialize")?;

    let fragments = engine
        .recognize(&source_id, &bytes)
        .with_context(|| format!("OCR failed for: {}", input.display()))?;

    if fragments.is_empty() {
        println!("[!] No text recognized. Check image quality and text size.");
        return Ok(());
    }

    println!("Recognized fragments");
    println!("====================");
    for fragment in &fragments {
        let mut line = format!("- {}", fragment.text);
        if let Some(confidence) = fragment.confidence {
            line.push_str(&format!(" ({confidence:.2})"));
        }
        if let Some(bbox) = &fragment.bbox {
            line.push_str(&format!(
                " [x:{:.0} y:{:.0} w:{:.0} h:{:.0}]",
                bbox.x0,
                bbox.y0,
                bbox.width(),
                bbox.height()
            ));
        }
        println!("{line}");
    }

    Ok(())
}
