//! Encore - Importer
//!
//! Turns audio files picked by the user (or found on disk) into library
//! tracks.
//!
//! # Architecture
//!
//! - `naming`: size ceiling, supported extensions, "Artist - Title" filename convention
//! - `probe`: best-effort duration probing (lofty) under a timeout
//! - `pipeline`: `IngestionPipeline`, validate → persist bytes → probe → save track
//! - `scanner`: recursive directory scan for audio files
//! - `duplicate`: pre-ingest duplicate check
//!
//! # Example
//!
//! ```rust
//! use encore_core::{MemoryMediaStore, MemoryStorage};
//! use encore_importer::{IngestConfig, IngestionPipeline};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> encore_importer::Result<()> {
//! let pipeline = IngestionPipeline::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryMediaStore::new()),
//!     IngestConfig::default(),
//! );
//!
//! let bytes = b"not really audio".to_vec();
//! let size = bytes.len() as u64;
//! let track = pipeline.ingest(bytes, "Daft Punk - One More Time.mp3", size).await?;
//! assert_eq!(track.artist, "Daft Punk");
//! assert_eq!(track.title, "One More Time");
//! # Ok(())
//! # }
//! ```

mod error;
mod types;

pub mod duplicate;
pub mod naming;
pub mod pipeline;
pub mod probe;
pub mod scanner;

pub use duplicate::is_duplicate;
pub use error::ImportError;
pub use naming::{parse_file_name, MAX_FILE_SIZE, SUPPORTED_EXTENSIONS};
pub use pipeline::IngestionPipeline;
pub use probe::{DurationProbe, LoftyProbe};
pub use scanner::{is_audio_file, scan_directories, FileScanner};
pub use types::{IngestConfig, IngestFailure, IngestReport};

pub type Result<T> = std::result::Result<T, ImportError>;
