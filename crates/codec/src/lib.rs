//! Cell-chunked storage of compressed images.
//!
//! Spreadsheet cells cap how many characters they hold, and photographs
//! encoded as base64 are far larger. This crate compresses an image until it
//! fits the cells reserved for it, splits the payload across those cells and
//! reassembles it on read.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetcell_codec::{AssetCodec, CellLayout, Config, MemoryCellStore, Preset};
//!
//! let config = Config::load(None)?;
//! let codec = AssetCodec::from_config(&config.schema, Preset::Product)?;
//! let mut store = MemoryCellStore::default();
//! let layout = CellLayout::for_field("image");
//!
//! let photo = std::fs::read("photo.jpg").expect("readable photo");
//! codec.store(&mut store, "product-42", &layout, &photo)?;
//!
//! let payload = codec.load(&store, "product-42", &layout)?.expect("stored image");
//! println!("{}", payload.to_data_url().len());
//! # Ok::<(), sheetcell_codec::CodecError>(())
//! ```

#![warn(missing_docs)]

mod chunk;
mod codec;
pub mod config;
mod error;
pub mod store;

pub use chunk::{join, split, Chunk};
pub use codec::{decode, AssetCodec, EncodedAsset};
pub use config::{Config, ConfigSchema, Preset, StorageConfig};
pub use error::{CodecError, Result};
pub use store::{CellLayout, CellStore, MemoryCellStore};

pub use sheetcell_image::{CompressionPolicy, EncodedPayload, Exhaustion, MediaType};
