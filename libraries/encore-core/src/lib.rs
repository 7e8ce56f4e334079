//! Encore Core
//!
//! Platform-agnostic core types, collaborator traits, and error handling for Encore.
//!
//! This crate provides the foundational building blocks shared by the playback
//! engine, the importer, the storage layer and the CLI.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, the value record every other crate passes around
//! - **Collaborator Traits**: `Storage` (key-value + track catalog), `MediaStore`
//!   (durable file bytes), `RemoteCatalog` (streaming service records)
//! - **Reference Implementations**: `MemoryStorage`, `MemoryMediaStore`
//! - **Error Handling**: Unified `EncoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use encore_core::{MemoryStorage, Storage, Track};
//!
//! # async fn example() -> encore_core::Result<()> {
//! let storage = MemoryStorage::new();
//! let track = Track::local("local-1", "One More Time", "Daft Punk", "music/local-1.mp3");
//!
//! storage.save_track(&track, "music/local-1.mp3").await?;
//! assert!(storage.get_track("local-1").await?.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod media;
pub mod memory;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use catalog::{search_library, RemoteCatalog, RemoteTrack};
pub use error::{EncoreError, Result};
pub use media::{MediaStore, MemoryMediaStore, StoredEncoding};
pub use memory::MemoryStorage;
pub use storage::{position_key, Storage, TrackPredicate, LAST_PLAYED_KEY};
pub use types::Track;
