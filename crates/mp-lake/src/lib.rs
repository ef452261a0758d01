//! # mp-lake
//!
//! Local partition storage for metaport: everything between "files exist on
//! disk" and "records ready to consolidate".
//!
//! ## Layout
//!
//! - `<root>/raw/<type>/chunk-*.{json,jsonl,parquet}`: pre-transform chunks
//! - `<root>/transformed/<type>/chunk-*.{json,jsonl,parquet}`: post-transform chunks
//! - `<root>/transformed/<type>/statistics.json`: per-type counts sidecar
//!
//! Chunks are produced by upstream writers that know nothing about this
//! crate. They are discovered ([`ChunkLocator`]), decoded ([`reader`]) and
//! iterated per type with a transformed-then-raw preference
//! ([`ChunkCursor`]). Artifacts built from them are replaced atomically
//! ([`AtomicFile`]). Remote partitions can be pulled down first
//! ([`ObjectStoreDownloader`]).

pub mod atomic;
pub mod cursor;
pub mod download;
pub mod error;
pub mod locator;
pub mod reader;
pub mod stats;

pub use atomic::{AtomicFile, write_atomic};
pub use cursor::{ChunkCursor, LoadedChunk};
pub use download::{ObjectStoreDownloader, PrefixDownloader};
pub use error::LakeError;
pub use locator::ChunkLocator;
pub use reader::{ChunkFormat, ChunkLoad, RecordReader, RecordStream, load_chunk, open_records};
pub use stats::{read_statistics, type_statistics};
