//! Terminal output helpers.

use owo_colors::OwoColorize;
use sheetcell_codec::EncodedAsset;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message, with an optional hint on the next line
pub fn error(message: &str, hint: Option<&str>) {
    eprintln!("{} {}", "✗".red(), message);
    if let Some(hint) = hint {
        eprintln!("  {}", hint.dimmed());
    }
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Format a byte or character count for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Human-readable summary of an encoded asset
pub fn print_asset(asset: &EncodedAsset) {
    println!("Format: {}", asset.media_type.mime_type());
    println!("Dimensions: {}x{}", asset.width, asset.height);
    println!("Quality: {:.2}", asset.quality);
    println!("Attempts: {}{}", asset.attempts, if asset.forced { " (forced)" } else { "" });
    println!("Encoded length: {} characters", asset.encoded_length);
    for chunk in &asset.chunks {
        println!(
            "  {} {} / {} characters",
            format!("[{}]", chunk.ordinal).dimmed(),
            chunk.len(),
            chunk.capacity
        );
    }
}

/// JSON summary of an encoded asset
pub fn asset_json(asset: &EncodedAsset) -> serde_json::Value {
    serde_json::json!({
        "media_type": asset.media_type,
        "width": asset.width,
        "height": asset.height,
        "quality": asset.quality,
        "attempts": asset.attempts,
        "forced": asset.forced,
        "encoded_length": asset.encoded_length,
        "chunks": asset.chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
    })
}
