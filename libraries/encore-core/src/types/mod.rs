//! Domain types

mod track;

pub use track::{Track, DEFAULT_ALBUM, DEFAULT_ARTWORK, UNKNOWN_ARTIST};
