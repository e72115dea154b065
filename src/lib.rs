//! xnbkit: XNB game-asset container decoding and encoding in Rust.
//!
//! The crate provides:
//! - The container codec (`xnb`): header parsing, decompression, the reader
//!   table and the root content
//! - Type readers and the generic type-name parser (`readers`)
//! - LZX decompression and LZ4 block compression (`compress`)
//! - JSON import/export with side files (`porter`, `json` feature)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use xnbkit::Value;
//!
//! let bytes = std::fs::read("Content/Data/Fish.xnb").unwrap();
//! let doc = xnbkit::unpack(&bytes).unwrap();
//! if let Value::Dictionary(entries) = &doc.content {
//!     println!("{} entries", entries.len());
//! }
//! let rebuilt = xnbkit::pack(&doc).unwrap();
//! assert_eq!(xnbkit::unpack(&rebuilt).unwrap(), doc);
//! ```

pub mod buffer;
pub mod compress;
pub mod error;
pub mod readers;
pub mod xnb;

#[cfg(feature = "json")]
pub mod porter;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Result, XnbError};
pub use xnb::{Document, Export, UnpackOptions, Value, pack, unpack, unpack_with};
