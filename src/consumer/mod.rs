//! Read access to encoded maps: parsing, position queries and iteration.

mod basic;
mod indexed;
pub(crate) mod raw;

pub use basic::BasicConsumer;
pub use indexed::IndexedConsumer;

use crate::mapping::{Mapping, ResolvedMapping};
use crate::search::Bias;
use crate::{LookupResult, ParseError, ParseResult};
use indexed::MergedViews;
use raw::RawSourceMap;
use simd_json_derive::Deserialize;

/// The result of mapping a generated position back: a resolved source,
/// a position in it, and the original identifier if one was recorded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OriginalPosition {
    pub source: String,
    pub line: u32,
    pub column: u32,
    pub name: Option<String>,
}

/// The result of mapping an original position forward.
///
/// `last_column` is the last generated column the mapping covers, or
/// `None` when it runs to the end of its generated line.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GeneratedPosition {
    pub line: u32,
    pub column: u32,
    pub last_column: Option<u32>,
}

/// Which sorted view [Consumer::mappings] iterates.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum IterOrder {
    #[default]
    Generated,
    Original,
}

/// A parsed map, ready for queries in either direction.
///
/// Maps with a `sections` field concatenate sub-maps at generated offsets
/// and get the indexed variant; everything else is a plain map. Queries
/// share one signature across both.
#[derive(Debug, Clone)]
pub enum Consumer {
    Basic(BasicConsumer),
    Indexed(IndexedConsumer),
}

/// Maps served over HTTP may carry an XSSI guard line such as `)]}'`,
/// which has to go before the JSON parser sees the payload.
fn strip_guard(json: &mut [u8]) -> &mut [u8] {
    if json.starts_with(b")]}'") {
        if let Some(idx) = memchr::memchr(b'\n', json) {
            return json.split_at_mut(idx + 1).1;
        }
    }
    json
}

fn strip_guard_str(json: &mut str) -> &mut str {
    if json.starts_with(")]}'") {
        if let Some(idx) = json.find('\n') {
            return json.split_at_mut(idx + 1).1;
        }
    }
    json
}

impl Consumer {
    /// Parses a consumer out of JSON bytes.
    pub fn from_json(mut json: Vec<u8>) -> ParseResult<Self> {
        Self::from_slice(&mut json)
    }

    /// Like [from_json](Self::from_json), with the URL the map was fetched
    /// from; sources resolve against it.
    pub fn from_json_with_url(mut json: Vec<u8>, map_url: &str) -> ParseResult<Self> {
        Self::from_slice_with_url(&mut json, map_url)
    }

    /// Parses a consumer, reusing the buffer as parser scratch space.
    pub fn from_slice(json: &mut [u8]) -> ParseResult<Self> {
        let json = strip_guard(json);
        Self::from_raw(RawSourceMap::from_slice(json)?, None)
    }

    pub fn from_slice_with_url(json: &mut [u8], map_url: &str) -> ParseResult<Self> {
        let json = strip_guard(json);
        Self::from_raw(RawSourceMap::from_slice(json)?, Some(map_url))
    }

    /// Parses a consumer from a string, reusing it as scratch space.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &mut str) -> ParseResult<Self> {
        let json = strip_guard_str(json);
        Self::from_raw(RawSourceMap::from_str(json)?, None)
    }

    pub(crate) fn from_raw(raw: RawSourceMap<'_>, map_url: Option<&str>) -> ParseResult<Self> {
        if raw.version != Some(3) {
            return Err(ParseError::UnsupportedFormat);
        }
        if raw.sections.is_some() {
            Ok(Self::Indexed(IndexedConsumer::from_raw(raw, map_url)?))
        } else {
            Ok(Self::Basic(BasicConsumer::from_raw(raw, map_url)?))
        }
    }
}

impl Consumer {
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Basic(consumer) => consumer.file(),
            Self::Indexed(consumer) => consumer.file(),
        }
    }

    pub fn source_root(&self) -> Option<&str> {
        match self {
            Self::Basic(consumer) => consumer.source_root(),
            Self::Indexed(_) => None,
        }
    }

    /// The sources of the map, fully resolved, in positional order.
    pub fn sources(&self) -> Vec<String> {
        match self {
            Self::Basic(consumer) => consumer.sources().to_vec(),
            Self::Indexed(consumer) => consumer.sources(),
        }
    }

    pub(crate) fn knows_source(&self, source: &str) -> bool {
        match self {
            Self::Basic(consumer) => consumer.find_source_index(source).is_some(),
            Self::Indexed(consumer) => consumer.knows_source(source),
        }
    }

    /// Maps a generated position back to an original one.
    ///
    /// `Ok(None)` means the position has no mapping on its generated line,
    /// or maps to a mapping that carries no original side.
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> ParseResult<Option<OriginalPosition>> {
        match self {
            Self::Basic(consumer) => consumer.original_position_for(line, column, bias),
            Self::Indexed(consumer) => consumer.original_position_for(line, column, bias),
        }
    }

    /// Maps a position in `source` forward to the generated text.
    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> ParseResult<Option<GeneratedPosition>> {
        match self {
            Self::Basic(consumer) => consumer.generated_position_for(source, line, column, bias),
            Self::Indexed(consumer) => consumer.generated_position_for(source, line, column, bias),
        }
    }

    /// Every generated position a line (or an exact position, when
    /// `column` is given) of `source` maps to.
    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> ParseResult<Vec<GeneratedPosition>> {
        match self {
            Self::Basic(consumer) => consumer.all_generated_positions_for(source, line, column),
            Self::Indexed(consumer) => consumer.all_generated_positions_for(source, line, column),
        }
    }

    /// see [BasicConsumer::source_content_for].
    pub fn source_content_for(
        &self,
        source: &str,
        nil_on_missing: bool,
    ) -> LookupResult<Option<&str>> {
        match self {
            Self::Basic(consumer) => consumer.source_content_for(source, nil_on_missing),
            Self::Indexed(consumer) => consumer.source_content_for(source, nil_on_missing),
        }
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        match self {
            Self::Basic(consumer) => consumer.has_contents_of_all_sources(),
            Self::Indexed(consumer) => consumer.has_contents_of_all_sources(),
        }
    }

    /// Iterates every mapping with sources and names resolved.
    pub fn mappings(&self, order: IterOrder) -> ParseResult<Mappings<'_>> {
        let (items, resolver) = match self {
            Self::Basic(consumer) => {
                let views = consumer.views()?;
                let items = match order {
                    IterOrder::Generated => views.generated.as_slice(),
                    IterOrder::Original => views.original.as_slice(),
                };
                (items, Resolver::Basic(consumer))
            }
            Self::Indexed(consumer) => {
                let merged = consumer.merged_views()?;
                let items = match order {
                    IterOrder::Generated => merged.generated(),
                    IterOrder::Original => merged.original(),
                };
                (items, Resolver::Indexed(merged))
            }
        };
        Ok(Mappings {
            items: items.iter(),
            resolver,
        })
    }
}

/// Iterator over a consumer's mappings, in the requested order.
#[derive(Debug, Clone)]
pub struct Mappings<'a> {
    items: std::slice::Iter<'a, Mapping>,
    resolver: Resolver<'a>,
}

#[derive(Debug, Clone)]
enum Resolver<'a> {
    Basic(&'a BasicConsumer),
    Indexed(&'a MergedViews),
}

impl Iterator for Mappings<'_> {
    type Item = ResolvedMapping;

    fn next(&mut self) -> Option<Self::Item> {
        let mapping = self.items.next()?;
        Some(match &self.resolver {
            Resolver::Basic(consumer) => consumer.resolve(mapping),
            Resolver::Indexed(views) => views.resolve(mapping),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for Mappings<'_> {}
