//! sheetcell: compress images into spreadsheet cells and read them back.

mod output;
mod sheet;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use sheet::JsonSheet;
use sheetcell_codec::{
    AssetCodec, CellLayout, CellStore, CodecError, Config, EncodedAsset, Preset,
};
use sheetcell_image::{
    fit_within, measure, sniff_media_type, ImageRasterizer, Rasterizer, MAGIC_BYTES_LEN,
};
use sheetcell_telemetry::{TelemetryConfig, Timer};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "sheetcell")]
#[command(about = "Compress images into spreadsheet cells and read them back")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to .sheetcell.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    Product,
    Portfolio,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Product => Preset::Product,
            PresetArg::Portfolio => Preset::Portfolio,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an image and store it in a sheet row
    Encode {
        /// Path to image file
        path: PathBuf,
        /// Sheet file (JSON)
        #[arg(long)]
        sheet: PathBuf,
        /// Row identifier
        #[arg(long)]
        row: String,
        /// Primary column; the extra column is `<field>_extra`
        #[arg(long, default_value = "image")]
        field: String,
        /// Compression preset
        #[arg(long, value_enum, default_value = "product")]
        preset: PresetArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reassemble an image stored in a sheet row
    Decode {
        /// Sheet file (JSON)
        #[arg(long)]
        sheet: PathBuf,
        /// Row identifier
        #[arg(long)]
        row: String,
        /// Primary column; the extra column is `<field>_extra`
        #[arg(long, default_value = "image")]
        field: String,
        /// Write the image bytes here instead of printing a data URL
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report the decoded size of a base64 payload file
    Measure {
        /// Text file holding the payload (with or without a data: prefix)
        path: PathBuf,
    },
    /// Show how an image would be encoded without storing it
    Inspect {
        /// Path to image file
        path: PathBuf,
        /// Compression preset
        #[arg(long, value_enum, default_value = "product")]
        preset: PresetArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encode every image in a directory, one row per file
    Batch {
        /// Directory to scan
        path: PathBuf,
        /// Sheet file (JSON)
        #[arg(long)]
        sheet: PathBuf,
        /// Primary column; the extra column is `<field>_extra`
        #[arg(long, default_value = "image")]
        field: String,
        /// Compression preset
        #[arg(long, value_enum, default_value = "product")]
        preset: PresetArg,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    };
    if let Err(e) = sheetcell_telemetry::init_with_config(telemetry.with_json(cli.json_logs)) {
        output::warning(&e.to_string());
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let hint = e.downcast_ref::<CodecError>().and_then(hint_for);
            output::error(&format!("{e:#}"), hint);
            ExitCode::FAILURE
        }
    }
}

fn hint_for(error: &CodecError) -> Option<&'static str> {
    match error {
        CodecError::AssetTooLarge { .. } => Some("Choose a smaller source image or reserve more cells."),
        e if e.is_user_recoverable() => Some("Choose another image file."),
        _ => None,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let capacity = config.schema.storage.single_cell_capacity;
    debug!(path = ?config.path, capacity, "Loaded configuration");

    match cli.command {
        Commands::Encode {
            path,
            sheet,
            row,
            field,
            preset,
            json,
        } => {
            let codec = AssetCodec::from_config(&config.schema, preset.into())?;
            let source = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let mut sheet = JsonSheet::open(&sheet, capacity)?;

            let timer = Timer::start("encode");
            let asset = codec.store(&mut sheet, &row, &CellLayout::for_field(&field), &source)?;
            let elapsed = timer.stop();

            if json {
                println!("{}", serde_json::to_string_pretty(&output::asset_json(&asset))?);
            } else {
                output::print_asset(&asset);
                output::success(&format!(
                    "Stored {} in row {row} ({} ms)",
                    path.display(),
                    elapsed.as_millis()
                ));
            }
        }

        Commands::Decode {
            sheet,
            row,
            field,
            out,
        } => {
            let codec = AssetCodec::from_config(&config.schema, Preset::Product)?;
            let sheet = JsonSheet::open(&sheet, capacity)?;
            let payload = codec
                .load(&sheet, &row, &CellLayout::for_field(&field))?
                .with_context(|| format!("row {row} has no image in column {field}"))?;

            match out {
                Some(out) => {
                    let bytes = payload.to_bytes()?;
                    std::fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
                    output::success(&format!(
                        "Wrote {} ({}, {})",
                        out.display(),
                        payload.media_type.mime_type(),
                        output::format_size(bytes.len())
                    ));
                }
                None => println!("{}", payload.to_data_url()),
            }
        }

        Commands::Measure { path } => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let text = text.trim();
            let payload = sheetcell_image::strip_prefix(text);
            let chars = payload.chars().count();
            println!("Decoded size: {}", output::format_size(measure(text)));
            println!("Characters: {chars}");
            println!(
                "Cells needed: {} (capacity {capacity})",
                chars.div_ceil(capacity).max(1)
            );
        }

        Commands::Inspect { path, preset, json } => {
            let source = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let media_type = sniff_media_type(&source)?;
            let rasterizer = ImageRasterizer::default();
            let (width, height) = rasterizer.dimensions(&rasterizer.decode(&source)?);
            let storage = &config.schema.storage;
            let (target_width, target_height) = fit_within(width, height, storage.max_width, storage.max_height);

            let codec = AssetCodec::from_config(&config.schema, preset.into())?;
            let encoded = codec.encode(&source);

            if json {
                let mut report = serde_json::json!({
                    "path": path.to_string_lossy(),
                    "source_type": media_type,
                    "source_size": source.len(),
                    "width": width,
                    "height": height,
                    "target_width": target_width,
                    "target_height": target_height,
                });
                match &encoded {
                    Ok(asset) => report["encoded"] = output::asset_json(asset),
                    Err(e) => report["error"] = serde_json::Value::String(e.to_string()),
                }
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Source: {} ({})", media_type.mime_type(), output::format_size(source.len()));
                println!("Source dimensions: {width}x{height}");
                println!("Envelope fit: {target_width}x{target_height}");
                match &encoded {
                    Ok(asset) => output::print_asset(asset),
                    Err(e) => output::warning(&e.to_string()),
                }
            }
        }

        Commands::Batch {
            path,
            sheet,
            field,
            preset,
        } => {
            let mut sheet = JsonSheet::open(&sheet, capacity)?;
            let layout = CellLayout::for_field(&field);
            let mut storage = config.schema.storage.clone();
            storage.single_cell_capacity = sheet.cell_capacity()?.min(capacity);
            storage.cell_slots = layout.len();
            let codec = AssetCodec::new(storage, config.schema.policy(preset.into()).clone())?;
            let (batch, duplicates) = assign_rows(&path, collect_images(&path));
            for (row, file) in &duplicates {
                output::warning(&format!("{}: row {row} is already taken, skipping", file.display()));
            }
            debug!(root = %path.display(), files = batch.len(), skipped = duplicates.len(), "Collected batch");

            let pb = ProgressBar::new(batch.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                    .progress_chars("#>-"),
            );

            // Compression is independent per file; only the sheet writes are sequential
            let encoded: Vec<(String, PathBuf, Result<EncodedAsset, CodecError>)> = batch
                .into_par_iter()
                .map(|(row, file)| {
                    let result = std::fs::read(&file)
                        .map_err(|e| CodecError::Store(format!("reading {}: {e}", file.display())))
                        .and_then(|source| codec.encode(&source));
                    pb.inc(1);
                    (row, file, result)
                })
                .collect();
            pb.finish_and_clear();

            let mut stored = 0;
            for (row, file, result) in encoded {
                match result {
                    Ok(asset) => {
                        sheet.write_cells(&row, &asset.cells(&layout)?)?;
                        stored += 1;
                    }
                    Err(e) => output::warning(&format!("{}: {e}", file.display())),
                }
            }

            output::success(&format!("Stored {stored} images"));
        }
    }

    Ok(())
}

/// Files under `dir` whose magic bytes look like an image.
fn collect_images(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            read_head(e.path())
                .map(|head| sniff_media_type(&head).is_ok_and(|media| media.is_decodable()))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect()
}

/// The first [`MAGIC_BYTES_LEN`] bytes of a file.
fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(MAGIC_BYTES_LEN);
    std::fs::File::open(path)?
        .take(MAGIC_BYTES_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// Pair each file with its row id; files whose id is already taken are
/// returned separately, first file wins.
fn assign_rows(root: &Path, files: Vec<PathBuf>) -> (Vec<(String, PathBuf)>, Vec<(String, PathBuf)>) {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .map(|file| (row_for(root, &file), file))
        .partition(|(row, _)| seen.insert(row.clone()))
}

/// Row id for a batch file: its path relative to the batch root, without extension.
fn row_for(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .with_extension("")
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}
