use crate::consumer::basic::{collect_generated_positions, Views};
use crate::consumer::raw::RawSourceMap;
use crate::consumer::{Consumer, GeneratedPosition, IterOrder, OriginalPosition};
use crate::interner::OrderedSet;
use crate::mapping::{Mapping, Position, ResolvedMapping};
use crate::search::{search, Bias};
use crate::{LookupError, LookupResult, ParseError, ParseResult};
use std::sync::OnceLock;

/// A consumer over an indexed map, which concatenates sub-maps at fixed
/// generated offsets.
///
/// Point queries are translated into the owning section and delegated to
/// its consumer. Whole-map iteration and reverse queries instead merge
/// every section's mappings, offsets applied, into one pair of sorted
/// views, built lazily like a plain consumer's.
#[derive(Debug, Clone)]
pub struct IndexedConsumer {
    file: Option<String>,
    sections: Vec<Section>,
    views: OnceLock<ParseResult<MergedViews>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Section {
    // the first generated position the section covers: 1-based line,
    // 0-based column, directly comparable with query positions
    offset: Position,
    consumer: Consumer,
}

#[derive(Debug, Clone)]
pub(crate) struct MergedViews {
    views: Views,
    sources: OrderedSet,
    names: OrderedSet,
}

impl IndexedConsumer {
    pub(crate) fn from_raw(raw: RawSourceMap<'_>, map_url: Option<&str>) -> ParseResult<Self> {
        let raw_sections = raw.sections.unwrap_or_default();
        let mut sections = Vec::with_capacity(raw_sections.len());
        let mut last: Option<(u32, u32)> = None;

        for section in raw_sections {
            if section.url.is_some() {
                return Err(ParseError::SectionUrlUnsupported);
            }
            let map = section.map.ok_or(ParseError::SectionMissingMap)?;
            let offset = (section.offset.line, section.offset.column);
            if matches!(last, Some(prev) if offset < prev) {
                return Err(ParseError::SectionsUnordered);
            }
            last = Some(offset);
            sections.push(Section {
                offset: Position::new(offset.0 + 1, offset.1),
                consumer: Consumer::from_raw(map, map_url)?,
            });
        }

        Ok(Self {
            file: raw.file.map(ToOwned::to_owned),
            sections,
            views: OnceLock::new(),
        })
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The sources of every section, in section order.
    pub fn sources(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|section| section.consumer.sources())
            .collect()
    }

    pub(crate) fn knows_source(&self, source: &str) -> bool {
        self.sections
            .iter()
            .any(|section| section.consumer.knows_source(source))
    }
}

impl IndexedConsumer {
    /// The section covering a generated position, found by binary search
    /// over the section offsets.
    fn section_for(&self, line: u32, column: u32) -> Option<&Section> {
        let needle = Position::new(line, column);
        let idx = search(
            &self.sections,
            &needle,
            |section| section.offset,
            Bias::GreatestLowerBound,
        )?;
        Some(&self.sections[idx])
    }

    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> ParseResult<Option<OriginalPosition>> {
        let Some(section) = self.section_for(line, column) else {
            return Ok(None);
        };
        // translate into the section's own coordinates
        let local_line = line - (section.offset.line - 1);
        let local_column = if section.offset.line == line {
            column.saturating_sub(section.offset.column)
        } else {
            column
        };
        section
            .consumer
            .original_position_for(local_line, local_column, bias)
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> ParseResult<Option<GeneratedPosition>> {
        // sections rarely share sources, so a linear scan with a cheap
        // membership test beats anything clever
        for section in &self.sections {
            if !section.consumer.knows_source(source) {
                continue;
            }
            let Some(position) = section
                .consumer
                .generated_position_for(source, line, column, bias)?
            else {
                continue;
            };
            let shift = |column: u32| {
                if position.line == 1 {
                    column + section.offset.column
                } else {
                    column
                }
            };
            return Ok(Some(GeneratedPosition {
                line: position.line + (section.offset.line - 1),
                column: shift(position.column),
                last_column: position.last_column.map(shift),
            }));
        }
        Ok(None)
    }

    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> ParseResult<Vec<GeneratedPosition>> {
        let merged = self.merged_views()?;
        let Ok(source_id) = merged.sources.index_of(source) else {
            return Ok(Vec::new());
        };
        Ok(collect_generated_positions(
            &merged.views,
            source_id,
            line,
            column,
        ))
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        self.sections
            .iter()
            .all(|section| section.consumer.has_contents_of_all_sources())
    }

    pub fn source_content_for(
        &self,
        source: &str,
        nil_on_missing: bool,
    ) -> LookupResult<Option<&str>> {
        for section in &self.sections {
            if let Some(content) = section.consumer.source_content_for(source, true)? {
                return Ok(Some(content));
            }
        }
        if nil_on_missing {
            Ok(None)
        } else {
            Err(LookupError::UnknownSource(source.to_owned()))
        }
    }
}

impl IndexedConsumer {
    fn build_views(&self) -> ParseResult<MergedViews> {
        let mut sources = OrderedSet::new();
        let mut names = OrderedSet::new();
        let mut generated = Vec::new();

        for section in &self.sections {
            for resolved in section.consumer.mappings(IterOrder::Generated)? {
                // offsets shift only the section's own first line
                let on_first_line = resolved.generated.line == 1;
                let mut mapping = Mapping::new(
                    resolved.generated.line + (section.offset.line - 1),
                    resolved.generated.column
                        + if on_first_line {
                            section.offset.column
                        } else {
                            0
                        },
                );
                if let (Some(source), Some(original)) = (&resolved.source, resolved.original) {
                    mapping = mapping.with_original(
                        sources.add(source, false),
                        original.line,
                        original.column,
                    );
                    if let Some(name) = &resolved.name {
                        mapping = mapping.with_name(names.add(name, false));
                    }
                }
                generated.push(mapping);
            }
        }

        generated.sort_by(Mapping::cmp_by_generated);
        let mut original: Vec<Mapping> = generated
            .iter()
            .copied()
            .filter(Mapping::has_original)
            .collect();
        original.sort_by(Mapping::cmp_by_original);

        Ok(MergedViews {
            views: Views {
                generated,
                original,
            },
            sources,
            names,
        })
    }

    pub(crate) fn merged_views(&self) -> ParseResult<&MergedViews> {
        self.views
            .get_or_init(|| self.build_views())
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl MergedViews {
    pub(crate) fn generated(&self) -> &[Mapping] {
        &self.views.generated
    }

    pub(crate) fn original(&self) -> &[Mapping] {
        &self.views.original
    }

    pub(crate) fn resolve(&self, mapping: &Mapping) -> ResolvedMapping {
        match mapping.original() {
            Some(original) => ResolvedMapping {
                generated: mapping.generated(),
                source: self
                    .sources
                    .at(original.source)
                    .ok()
                    .map(ToOwned::to_owned),
                original: Some(original.position),
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
