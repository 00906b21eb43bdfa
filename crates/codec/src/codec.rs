//! The asset codec: source image in, cell chunks out, and back.

use crate::chunk::{join, split, Chunk};
use crate::config::{ConfigSchema, Preset, StorageConfig};
use crate::store::{CellLayout, CellStore};
use crate::{CodecError, Result};
use sheetcell_image::{
    byte_budget_for_chars, AdaptiveCompressor, CompressionPolicy, EncodedPayload, ImageRasterizer,
    MediaType, Rasterizer,
};
use tracing::{debug, info, warn};

/// A compressed image split into storage chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAsset {
    /// Media type of the payload
    pub media_type: MediaType,
    /// Chunks in ordinal order
    pub chunks: Vec<Chunk>,
    /// Characters across all chunks
    pub encoded_length: usize,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Quality of the final render
    pub quality: f32,
    /// Convergence attempts spent after the first pass
    pub attempts: usize,
    /// Whether the forced final step produced the payload
    pub forced: bool,
}

impl EncodedAsset {
    /// Reassemble the payload.
    pub fn payload(&self) -> Result<EncodedPayload> {
        Ok(EncodedPayload::new(self.media_type, join(&self.chunks)?))
    }

    /// Cell values for every column of `layout`; unused slots are empty.
    ///
    /// Fails with [`CodecError::AssetTooLarge`] when a chunk has no column to
    /// land in, so a layout narrower than the storage slots never truncates.
    pub fn cells(&self, layout: &CellLayout) -> Result<Vec<(String, String)>> {
        if let Some(orphan) = self.chunks.iter().find(|chunk| chunk.ordinal >= layout.len()) {
            warn!(
                ordinal = orphan.ordinal,
                columns = layout.len(),
                "Chunk has no column in the cell layout"
            );
            let capacity = self.chunks.iter().map(|chunk| chunk.capacity).max().unwrap_or_default();
            return Err(CodecError::AssetTooLarge {
                length: self.encoded_length,
                ceiling: capacity.saturating_mul(layout.len()),
            });
        }

        Ok(layout
            .columns()
            .iter()
            .enumerate()
            .map(|(slot, column)| {
                let text = self
                    .chunks
                    .iter()
                    .find(|chunk| chunk.ordinal == slot)
                    .map(|chunk| chunk.text.clone())
                    .unwrap_or_default();
                (column.clone(), text)
            })
            .collect())
    }
}

/// Compresses images into cell-sized chunks and reassembles them.
#[derive(Debug, Clone)]
pub struct AssetCodec<R = ImageRasterizer> {
    storage: StorageConfig,
    compressor: AdaptiveCompressor<R>,
}

impl AssetCodec<ImageRasterizer> {
    /// Codec backed by the `image` crate.
    pub fn new(storage: StorageConfig, policy: CompressionPolicy) -> Result<Self> {
        Self::with_rasterizer(storage, policy, ImageRasterizer::default())
    }

    /// Codec for a preset of a loaded configuration.
    pub fn from_config(schema: &ConfigSchema, preset: Preset) -> Result<Self> {
        Self::new(schema.storage.clone(), schema.policy(preset).clone())
    }
}

impl<R: Rasterizer> AssetCodec<R> {
    /// Codec with a custom rasterizer.
    pub fn with_rasterizer(storage: StorageConfig, policy: CompressionPolicy, rasterizer: R) -> Result<Self> {
        storage.validate()?;
        policy
            .validate()
            .map_err(|e| CodecError::Config(e.to_string()))?;
        Ok(Self {
            storage,
            compressor: AdaptiveCompressor::new(rasterizer, policy),
        })
    }

    /// Storage configuration in use.
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Compression policy in use.
    pub fn policy(&self) -> &CompressionPolicy {
        self.compressor.policy()
    }

    /// Compress `source` and split it across the configured slots.
    ///
    /// Fails with [`CodecError::AssetTooLarge`] when even the best-effort
    /// payload does not fit; no chunks are produced in that case.
    pub fn encode(&self, source: &[u8]) -> Result<EncodedAsset> {
        self.encode_within(source, self.storage.single_cell_capacity, self.storage.cell_slots)
    }

    /// Reassemble chunks into a payload ready for display.
    pub fn decode(&self, chunks: &[Chunk]) -> Result<EncodedPayload> {
        decode(chunks)
    }

    /// Encode `source` and persist it into `layout`'s columns of `row`.
    ///
    /// Every slot is written, so an extra cell left over from a previous,
    /// larger image is cleared. Nothing is written when encoding fails.
    pub fn store<S: CellStore>(
        &self,
        store: &mut S,
        row: &str,
        layout: &CellLayout,
        source: &[u8],
    ) -> Result<EncodedAsset> {
        let capacity = store
            .cell_capacity()?
            .min(self.storage.single_cell_capacity);
        if capacity == 0 {
            return Err(CodecError::Store("store reports zero cell capacity".into()));
        }

        let asset = self.encode_within(source, capacity, layout.len())?;
        store.write_cells(row, &asset.cells(layout)?)?;
        info!(
            row,
            columns = ?layout.columns(),
            chunks = asset.chunks.len(),
            length = asset.encoded_length,
            "Stored asset"
        );
        Ok(asset)
    }

    /// Read `layout`'s columns of `row` and reassemble them.
    ///
    /// Returns `None` when every slot is empty or absent.
    pub fn load<S: CellStore>(&self, store: &S, row: &str, layout: &CellLayout) -> Result<Option<EncodedPayload>> {
        let cells = store.read_cells(row, layout.columns())?;
        let chunks = Chunk::from_cells(cells, self.storage.single_cell_capacity);
        let payload = decode(&chunks)?;
        debug!(row, length = payload.len(), "Loaded asset");
        Ok((!payload.is_empty()).then_some(payload))
    }

    fn encode_within(&self, source: &[u8], capacity: usize, slots: usize) -> Result<EncodedAsset> {
        let ceiling = capacity.saturating_mul(slots);
        let budget = byte_budget_for_chars(ceiling);
        let compressed = self.compressor.compress(
            source,
            budget,
            self.storage.max_width,
            self.storage.max_height,
        )?;

        let length = compressed.payload.len();
        if length > ceiling {
            warn!(length, ceiling, "Compressed payload exceeds cell ceiling");
            return Err(CodecError::AssetTooLarge { length, ceiling });
        }

        let chunks = split(compressed.payload.as_str(), capacity)?;
        info!(
            width = compressed.width,
            height = compressed.height,
            quality = compressed.quality,
            attempts = compressed.attempts,
            length,
            chunks = chunks.len(),
            "Encoded asset"
        );

        Ok(EncodedAsset {
            media_type: compressed.payload.media_type,
            chunks,
            encoded_length: length,
            width: compressed.width,
            height: compressed.height,
            quality: compressed.quality,
            attempts: compressed.attempts,
            forced: compressed.forced,
        })
    }
}

/// Join chunks and attach the media type for display.
///
/// Cells written by older producers may still carry a `data:` prefix in the
/// first chunk; it is honoured and stripped.
pub fn decode(chunks: &[Chunk]) -> Result<EncodedPayload> {
    Ok(EncodedPayload::parse(&join(chunks)?))
}
