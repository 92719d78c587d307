//! # posmap
//!
//! This crate provides bidirectional position mapping between a generated
//! text and the original sources it was produced from, using the encoded
//! map format emitted by compilers and bundlers.
//!
//! ## Getting Started
//!
//! ```ignore
//! use posmap::{Bias, Consumer};
//!
//! // Load an encoded map from a buffer
//! let consumer = Consumer::from_json(buf).unwrap();
//!
//! // Map a generated position (line 10, column 12) back to its origin
//! let found = consumer
//!     .original_position_for(10, 12, Bias::default())
//!     .unwrap();
//!
//! println!("(10, 12) came from {found:?}");
//! ```
//!
//! ## Overview
//!
//! ### `Consumer`
//!
//! [Consumer] parses an encoded map, plain or indexed, and answers
//! position queries in both directions. The heavy decoding work is done
//! lazily, once, on the first query.
//!
//! ### `Generator`
//!
//! [Generator] accumulates mapping records and serializes them back into
//! an encoded map, including composition with another map through
//! [apply_source_map](Generator::apply_source_map).
//!
//! ### `SourceNode`
//!
//! [SourceNode] is a tree of position-tagged text fragments: build one
//! from a transform's output (or reconstruct one from existing text and
//! its [Consumer]) and flatten it into text plus a fresh map in one pass.
//!
//! ### `Position`
//!
//! [Position] represents a 1-based line and 0-based column in a file.

mod consumer;
mod error;
mod generator;
mod interner;
mod mapping;
mod mapping_list;
mod node;
mod path;
mod search;
mod splitter;
mod vlq;

pub use consumer::*;
pub use error::*;
pub use generator::*;
pub use interner::OrderedSet;
pub use mapping::*;
pub use mapping_list::MappingRecord;
pub use node::*;
pub use search::Bias;
