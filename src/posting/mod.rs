//! Posting lists and the attribute-indexed posting list index.

pub mod codec;
pub mod index;
pub mod list;

pub use index::PostingIndex;
pub use list::PostingList;
