//! UTrie: a compacted two-stage trie for Unicode code point properties
//!
//! UTrie maps every Unicode code point to a small integer, as needed for character
//! properties such as line-breaking classes or East Asian widths.
//! Identical blocks of values are shared, so that tables for the whole code space
//! fit in a few kilobytes and each lookup takes one or two index reads.
//!
//! # Data structures
//!
//! - [`Builder`] is a mutable trie that accepts single values and ranges.
//! - [`Trie`] is the compacted and immutable form created by [`Builder::freeze()`].
//!
//! Values may be given as integers or as string labels. Labels are interned into a
//! value table shared by the builder and the trie, and [`Trie::get_value()`] maps
//! stored integers back to their labels.
//!
//! # Examples
//!
//! ## Building and looking up
//!
//! ```
//! use utrie::Builder;
//!
//! let mut builder = Builder::new(10, 666);
//! builder
//!     .set_range(13, 6666, 7788, false)?
//!     .set_range(6000, 7000, 9900, true)?;
//!
//! let trie = builder.freeze()?;
//! assert_eq!(trie.get(12), 10);
//! assert_eq!(trie.get(13), 7788);
//! assert_eq!(trie.get(6000), 9900);
//! assert_eq!(trie.get(7001), 10);
//! assert_eq!(trie.get(0x110000), 666);
//! # Ok::<(), utrie::errors::UtrieError>(())
//! ```
//!
//! ## Serializing and deserializing the data structure
//!
//! With the `codec` feature (enabled by default), a trie can be stored in a
//! compressed binary form or as base64 text, using
//! [`Trie::serialize_to_vec()`]/[`Trie::deserialize_from_slice()`] and
//! [`Trie::to_base64()`]/[`Trie::from_base64()`].
//!
//! ```
//! # #[cfg(feature = "codec")]
//! # {
//! use utrie::{Builder, Trie, Value};
//!
//! let mut builder = Builder::new("N", "N");
//! builder.set_range(0x1100, 0x115f, "W", true)?;
//! let text = builder.freeze()?.to_base64()?;
//!
//! let trie = Trie::from_base64(&text)?;
//! assert_eq!(trie.get_value(0x1100), Value::Label("W"));
//! # }
//! # Ok::<(), utrie::errors::UtrieError>(())
//! ```
#![deny(missing_docs)]

#[cfg(target_pointer_width = "16")]
compile_error!("`target_pointer_width` must be larger than or equal to 32");

mod builder;
#[cfg(feature = "codec")]
mod codec;
pub mod errors;
mod layout;
pub mod trie;
#[cfg(feature = "codec")]
mod utils;
mod values;

pub use builder::Builder;
pub use trie::Trie;
pub use values::Value;

/// Trait for statistics of the data structure.
pub trait Statistics {
    /// Returns the total amount of heap used by the data structure in bytes.
    fn heap_bytes(&self) -> usize;

    /// Returns the number of entries in the flat array of indexes and data.
    fn num_elems(&self) -> usize;
}
