use crate::consumer::raw::RawSourceMap;
use crate::consumer::{GeneratedPosition, OriginalPosition};
use crate::interner::OrderedSet;
use crate::mapping::{Mapping, Position, ResolvedMapping};
use crate::search::{search, Bias};
use crate::splitter::MappingSplitter;
use crate::{path, vlq, LookupError, LookupResult, ParseError, ParseResult};
use std::sync::OnceLock;

/// A consumer over a plain (non-indexed) encoded map.
///
/// The encoded `mappings` string is kept verbatim; the two sorted views it
/// expands into are computed on first query and cached for the consumer's
/// lifetime. A parse failure is cached the same way and replayed to every
/// later query, so a consumer is never left partially parsed.
#[derive(Debug, Clone)]
pub struct BasicConsumer {
    file: Option<String>,
    source_root: Option<String>,
    sources: OrderedSet,
    // sources resolved against source_root and the map's own URL,
    // parallel to the positional entries of `sources`
    absolute_sources: Vec<String>,
    names: OrderedSet,
    sources_content: Option<Vec<Option<String>>>,
    mappings: String,
    views: OnceLock<ParseResult<Views>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Views {
    pub generated: Vec<Mapping>,
    pub original: Vec<Mapping>,
}

impl BasicConsumer {
    pub(crate) fn from_raw(raw: RawSourceMap<'_>, map_url: Option<&str>) -> ParseResult<Self> {
        let source_root = raw
            .source_root
            .filter(|root| !root.is_empty())
            .map(path::normalize);

        let raw_sources = raw.sources.unwrap_or_default();
        let mut sources = OrderedSet::new();
        let mut absolute_sources = Vec::with_capacity(raw_sources.len());
        for source in &raw_sources {
            // an absent identifier is treated as the empty string
            let normalized = path::normalize(source.unwrap_or_default());
            let stored = match &source_root {
                Some(root) if path::is_absolute(root) && path::is_absolute(&normalized) => {
                    path::relative(root, &normalized)
                }
                _ => normalized,
            };
            absolute_sources.push(path::compute_source_url(
                source_root.as_deref(),
                Some(&stored),
                map_url,
            )?);
            sources.add(&stored, true);
        }

        let sources_content = match raw.sources_content {
            Some(content) => {
                if content.len() != raw_sources.len() {
                    return Err(ParseError::MismatchedSourcesContent {
                        sources: raw_sources.len() as u32,
                        sources_content: content.len() as u32,
                    });
                }
                Some(
                    content
                        .into_iter()
                        .map(|c| c.map(ToOwned::to_owned))
                        .collect(),
                )
            }
            None => None,
        };

        let names =
            OrderedSet::from_iter_with_duplicates(raw.names.unwrap_or_default().into_iter());

        Ok(Self {
            file: raw.file.map(ToOwned::to_owned),
            source_root,
            sources,
            absolute_sources,
            names,
            sources_content,
            mappings: raw.mappings.unwrap_or_default().to_owned(),
            views: OnceLock::new(),
        })
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    /// The sources of the map, fully resolved.
    #[inline]
    pub fn sources(&self) -> &[String] {
        &self.absolute_sources
    }
}

fn checked_field(value: i64, segment: &str) -> ParseResult<u32> {
    u32::try_from(value).map_err(|_| ParseError::MappingMalformed(segment.to_owned()))
}

impl BasicConsumer {
    fn parse_views(&self) -> ParseResult<Views> {
        let mut generated = Vec::new();

        let mut line = 1u32;
        let mut generated_col = 0i64;
        let mut source = 0i64;
        let mut original_line = 0i64;
        let mut original_col = 0i64;
        let mut name = 0i64;

        let mut fields = [0i64; 5];

        for (segment, new_line) in MappingSplitter::new(&self.mappings) {
            if !segment.is_empty() {
                let bytes = segment.as_bytes();
                let mut len = 0;
                let mut cursor = 0;
                while cursor < bytes.len() {
                    if len == fields.len() {
                        return Err(ParseError::MappingMalformed(segment.to_owned()));
                    }
                    let (value, next) = vlq::decode(bytes, cursor)?;
                    fields[len] = value;
                    len += 1;
                    cursor = next;
                }

                if !matches!(len, 1 | 4 | 5) {
                    return Err(ParseError::MappingMalformed(segment.to_owned()));
                }

                generated_col += fields[0];
                let mut mapping = Mapping::new(line, checked_field(generated_col, segment)?);

                if len > 1 {
                    source += fields[1];
                    let source_id = checked_field(source, segment)?;
                    if source_id >= self.sources.seq_len() {
                        return Err(ParseError::UnknownSourceReference(source_id));
                    }

                    original_line += fields[2];
                    original_col += fields[3];
                    // original lines are tracked 0-based on the wire
                    let stored_line = checked_field(original_line, segment)?
                        .checked_add(1)
                        .ok_or_else(|| ParseError::MappingMalformed(segment.to_owned()))?;
                    mapping = mapping.with_original(
                        source_id,
                        stored_line,
                        checked_field(original_col, segment)?,
                    );

                    if len == 5 {
                        name += fields[4];
                        let name_id = checked_field(name, segment)?;
                        if name_id >= self.names.seq_len() {
                            return Err(ParseError::UnknownNameReference(name_id));
                        }
                        mapping = mapping.with_name(name_id);
                    }
                }

                generated.push(mapping);
            }

            if new_line {
                line += 1;
                generated_col = 0;
            }
        }

        generated.sort_by(Mapping::cmp_by_generated);
        let mut original: Vec<Mapping> = generated
            .iter()
            .copied()
            .filter(Mapping::has_original)
            .collect();
        original.sort_by(Mapping::cmp_by_original);

        Ok(Views {
            generated,
            original,
        })
    }

    pub(crate) fn views(&self) -> ParseResult<&Views> {
        self.views
            .get_or_init(|| self.parse_views())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Resolves a source identifier to its interned index, accepting both
    /// the sourceRoot-relative and the fully resolved form.
    pub(crate) fn find_source_index(&self, source: &str) -> Option<u32> {
        let relative = match &self.source_root {
            Some(root) => path::relative(root, source),
            None => source.to_owned(),
        };
        if let Ok(idx) = self.sources.index_of(&relative) {
            return Some(idx);
        }
        self.absolute_sources
            .iter()
            .position(|s| s == source)
            .map(|idx| idx as u32)
    }

    pub(crate) fn resolve(&self, mapping: &Mapping) -> ResolvedMapping {
        match mapping.original() {
            Some(original) => ResolvedMapping {
                generated: mapping.generated(),
                source: self
                    .absolute_sources
                    .get(original.source as usize)
                    .cloned(),
                original: Some(original.position),
                // ids were validated while parsing the mappings string
                name: original
                    .name
                    .and_then(|id| self.names.at(id).ok())
                    .map(ToOwned::to_owned),
            },
            None => ResolvedMapping {
                generated: mapping.generated(),
                source: None,
                original: None,
                name: None,
            },
        }
    }
}

impl BasicConsumer {
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> ParseResult<Option<OriginalPosition>> {
        if line < 1 {
            return Ok(None);
        }
        let views = self.views()?;
        let needle = Position::new(line, column);
        let Some(idx) = search(&views.generated, &needle, Mapping::generated, bias) else {
            return Ok(None);
        };
        let mapping = &views.generated[idx];
        if mapping.generated().line != line {
            return Ok(None);
        }
        let Some(original) = mapping.original() else {
            return Ok(None);
        };
        Ok(Some(OriginalPosition {
            source: self
                .absolute_sources
                .get(original.source as usize)
                .cloned()
                .unwrap_or_default(),
            line: original.position.line,
            column: original.position.column,
            name: original
                .name
                .and_then(|id| self.names.at(id).ok())
                .map(ToOwned::to_owned),
        }))
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> ParseResult<Option<GeneratedPosition>> {
        if line < 1 {
            return Ok(None);
        }
        let Some(source_id) = self.find_source_index(source) else {
            return Ok(None);
        };
        let views = self.views()?;
        let needle = (source_id, Position::new(line, column));
        let Some(idx) = search(&views.original, &needle, Mapping::original_key, bias) else {
            return Ok(None);
        };
        let mapping = &views.original[idx];
        if mapping.original_key().0 != source_id {
            return Ok(None);
        }
        Ok(Some(span_for(&views.generated, mapping)))
    }

    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> ParseResult<Vec<GeneratedPosition>> {
        let Some(source_id) = self.find_source_index(source) else {
            return Ok(Vec::new());
        };
        let views = self.views()?;
        Ok(collect_generated_positions(views, source_id, line, column))
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        match &self.sources_content {
            Some(content) => {
                content.len() as u32 >= self.sources.len()
                    && content.iter().all(Option::is_some)
            }
            None => false,
        }
    }

    /// Returns the embedded content for a source.
    ///
    /// A map without any embedded content yields `Ok(None)`. For a map that
    /// carries content, an unknown source fails unless `nil_on_missing`
    /// opts into the lenient form.
    pub fn source_content_for(
        &self,
        source: &str,
        nil_on_missing: bool,
    ) -> LookupResult<Option<&str>> {
        let Some(contents) = &self.sources_content else {
            return Ok(None);
        };
        if let Some(idx) = self.find_source_index(source) {
            return Ok(contents.get(idx as usize).and_then(|c| c.as_deref()));
        }

        let relative = match &self.source_root {
            Some(root) => path::relative(root, source),
            None => source.to_owned(),
        };
        if let Some(root) = self.source_root.as_deref().and_then(path::url_parse) {
            // sources served off a file: root may have been recorded with
            // or without the scheme prefix
            let stripped = relative.strip_prefix("file://").unwrap_or(&relative);
            if root.scheme.as_deref() == Some("file") {
                if let Ok(idx) = self.sources.index_of(stripped) {
                    return Ok(contents.get(idx as usize).and_then(|c| c.as_deref()));
                }
            }
            if root.path.is_empty() || root.path == "/" {
                if let Ok(idx) = self.sources.index_of(&format!("/{relative}")) {
                    return Ok(contents.get(idx as usize).and_then(|c| c.as_deref()));
                }
            }
        }

        if nil_on_missing {
            Ok(None)
        } else {
            Err(LookupError::UnknownSource(relative))
        }
    }
}

/// Derives the column span of a mapping: the column just before the next
/// mapping on the same generated line, or `None` when the mapping extends
/// to the end of its line.
pub(crate) fn span_for(generated: &[Mapping], mapping: &Mapping) -> GeneratedPosition {
    let pos = mapping.generated();
    let idx = generated.partition_point(|m| m.generated() <= pos);
    let last_column = match generated.get(idx) {
        Some(next) if next.generated().line == pos.line => {
            Some(next.generated().column.saturating_sub(1))
        }
        _ => None,
    };
    GeneratedPosition {
        line: pos.line,
        column: pos.column,
        last_column,
    }
}

/// Least-upper-bound scan shared by the basic and indexed consumers.
pub(crate) fn collect_generated_positions(
    views: &Views,
    source_id: u32,
    line: u32,
    column: Option<u32>,
) -> Vec<GeneratedPosition> {
    let needle = (source_id, Position::new(line, column.unwrap_or(0)));
    let Some(start) = search(
        &views.original,
        &needle,
        Mapping::original_key,
        Bias::LeastUpperBound,
    ) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    let found_key = views.original[start].original_key();
    for mapping in &views.original[start..] {
        let (_, position) = mapping.original_key();
        let matches = match column {
            // every consecutive mapping on the same original line as the
            // one the search landed on
            None => position.line == found_key.1.line,
            // every consecutive mapping at the queried line and the found
            // column
            Some(_) => position.line == line && position.column == found_key.1.column,
        };
        if !matches {
            break;
        }
        results.push(span_for(&views.generated, mapping));
    }
    results
}
