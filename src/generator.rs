//! Building encoded maps record by record.

use crate::consumer::{Consumer, IterOrder};
use crate::interner::OrderedSet;
use crate::mapping::Position;
use crate::mapping_list::{MappingList, MappingRecord};
use crate::search::Bias;
use crate::vlq::VlqEncoder;
use crate::{path, ValidateError, ValidateResult};
use simd_json_derive::Serialize;
use std::collections::HashMap;
use std::io;
use std::io::Write;

/// Accumulates mappings and serializes them as an encoded map.
///
/// Records may arrive in any order; serialization sorts them at most once.
/// Validation of each record is on by default and can be switched off for
/// callers that guarantee consistency themselves.
///
/// ## Output
///
/// The encoded JSON is produced by:
/// - [`write`](Generator::write)
/// - [`to_vec`](Generator::to_vec)
/// - [`to_string`](Generator::to_string)
#[derive(Debug, Clone, Default)]
pub struct Generator {
    file: Option<String>,
    source_root: Option<String>,
    skip_validation: bool,
    sources: OrderedSet,
    names: OrderedSet,
    mappings: MappingList,
    // keyed by the source relative to source_root
    sources_content: HashMap<String, String>,
}

impl Generator {
    pub fn new() -> Self {
        Self {
            mappings: MappingList::new(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_source_root(mut self, source_root: impl Into<String>) -> Self {
        self.source_root = Some(source_root.into());
        self
    }

    pub fn with_skip_validation(mut self, skip_validation: bool) -> Self {
        self.skip_validation = skip_validation;
        self
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    /// Rebuilds a generator holding everything a consumer knows, so the
    /// map can be edited and re-serialized.
    pub fn from_consumer(consumer: &Consumer) -> crate::Result<Self> {
        let mut generator = Self::new();
        generator.file = consumer.file().map(ToOwned::to_owned);
        generator.source_root = consumer.source_root().map(ToOwned::to_owned);

        for resolved in consumer.mappings(IterOrder::Generated)? {
            let mut record = MappingRecord::generated_only(resolved.generated);
            if let (Some(source), Some(original)) = (resolved.source, resolved.original) {
                let source = match &generator.source_root {
                    Some(root) => path::relative(root, &source),
                    None => source,
                };
                record = MappingRecord::new(resolved.generated, original, source, resolved.name);
            }
            generator.add_mapping(record)?;
        }

        for source in consumer.sources() {
            if let Some(content) = consumer.source_content_for(&source, true)? {
                let content = content.to_owned();
                generator.set_source_content(&source, Some(content));
            }
        }
        Ok(generator)
    }

    /// Adds one mapping record.
    ///
    /// A record is either generated-only, or carries a source together
    /// with an original position; a name additionally requires the
    /// original side. Anything else fails unless validation is skipped.
    pub fn add_mapping(&mut self, record: MappingRecord) -> ValidateResult<()> {
        if !self.skip_validation {
            validate_record(&record)?;
        }
        if let Some(source) = &record.source {
            self.sources.add(source, false);
        }
        if let Some(name) = &record.name {
            self.names.add(name, false);
        }
        self.mappings.push(record);
        Ok(())
    }

    /// Sets or, with `None`, removes the embedded content for a source.
    pub fn set_source_content(&mut self, source: &str, content: Option<String>) {
        let key = match &self.source_root {
            Some(root) => path::relative(root, source),
            None => source.to_owned(),
        };
        match content {
            Some(content) => {
                self.sources_content.insert(key, content);
            }
            None => {
                self.sources_content.remove(&key);
            }
        }
    }

    /// Rewrites every mapping into `consumer`'s sources: a mapping whose
    /// source is the file the consumer describes is traced through it and
    /// re-pointed at the position the consumer reports.
    ///
    /// `source_file` names that file when the consumer's own `file` field
    /// does not; `source_map_path` is the directory of the applied map,
    /// for re-rooting its sources relative to this map.
    pub fn apply_source_map(
        &mut self,
        consumer: &Consumer,
        source_file: Option<&str>,
        source_map_path: Option<&str>,
    ) -> crate::Result<()> {
        let source_file = match source_file.or_else(|| consumer.file()) {
            Some(file) => file,
            None => return Err(ValidateError::MissingSourceFile.into()),
        };
        let source_root = self.source_root.clone();
        let source_file = match &source_root {
            Some(root) => path::relative(root, source_file),
            None => source_file.to_owned(),
        };

        // the interned sets are rebuilt wholesale, since rewriting can
        // orphan old sources and introduce new names
        let mut sources = OrderedSet::new();
        let mut names = OrderedSet::new();
        for record in self.mappings.iter_mut() {
            if record.source.as_deref() == Some(source_file.as_str()) {
                if let Some(original) = record.original {
                    if let Some(traced) = consumer.original_position_for(
                        original.line,
                        original.column,
                        Bias::default(),
                    )? {
                        let mut new_source = traced.source;
                        if let Some(dir) = source_map_path {
                            new_source = path::join(dir, &new_source);
                        }
                        if let Some(root) = &source_root {
                            new_source = path::relative(root, &new_source);
                        }
                        record.source = Some(new_source);
                        record.original = Some(Position::new(traced.line, traced.column));
                        if let Some(name) = traced.name {
                            record.name = Some(name);
                        }
                    }
                }
            }
            if let Some(source) = &record.source {
                sources.add(source, false);
            }
            if let Some(name) = &record.name {
                names.add(name, false);
            }
        }
        self.sources = sources;
        self.names = names;

        for source in consumer.sources() {
            if let Some(content) = consumer.source_content_for(&source, true)? {
                let content = content.to_owned();
                let key = match source_map_path {
                    Some(dir) => path::join(dir, &source),
                    None => source,
                };
                self.set_source_content(&key, Some(content));
            }
        }
        Ok(())
    }
}

fn validate_record(record: &MappingRecord) -> ValidateResult<()> {
    let generated_ok = record.generated.line > 0;
    match (&record.original, &record.source) {
        (None, None) if generated_ok && record.name.is_none() => Ok(()),
        (Some(original), Some(_)) if generated_ok && original.line > 0 => Ok(()),
        _ => Err(ValidateError::InvalidMapping(format!("{record:?}"))),
    }
}

impl Generator {
    pub fn write<W>(&mut self, w: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        w.write_all(br#"{"version":3"#)?;

        w.write_all(br#","sources":"#)?;
        self.sources.to_vec().json_write(w)?;
        w.write_all(br#","names":"#)?;
        self.names.to_vec().json_write(w)?;

        w.write_all(br#","mappings":""#)?;
        let records = self.mappings.to_sorted();
        serialize_mappings(records, &self.sources, &self.names, w)?;
        w.write_all(br#"""#)?;

        if let Some(file) = self.file.as_deref() {
            w.write_all(br#","file":"#)?;
            file.json_write(w)?;
        }
        if let Some(source_root) = self.source_root.as_deref() {
            w.write_all(br#","sourceRoot":"#)?;
            source_root.json_write(w)?;
        }
        if !self.sources_content.is_empty() {
            w.write_all(br#","sourcesContent":"#)?;
            let contents: Vec<Option<&str>> = self
                .sources
                .iter()
                .map(|source| {
                    let key = match self.source_root.as_deref() {
                        Some(root) => path::relative(root, source),
                        None => source.to_owned(),
                    };
                    self.sources_content.get(&key).map(String::as_str)
                })
                .collect();
            contents.json_write(w)?;
        }

        w.write_all(br#"}"#)
    }

    #[inline]
    pub fn to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut v = Vec::with_capacity(256 + self.mappings.len() * 8);
        self.write(&mut v)?;
        Ok(v)
    }

    #[inline]
    pub fn to_string(&mut self) -> io::Result<String> {
        self.to_vec()
            .map(|v| unsafe { String::from_utf8_unchecked(v) })
    }
}

fn serialize_mappings<W>(
    records: &[MappingRecord],
    sources: &OrderedSet,
    names: &OrderedSet,
    w: &mut W,
) -> io::Result<()>
where
    W: Write,
{
    let mut prev_generated_line = 1;
    let mut prev_generated_col = 0;
    let mut prev_source_id = 0;
    let mut prev_original_line = 0;
    let mut prev_original_col = 0;
    let mut prev_name_id = 0;

    for (idx, record) in records.iter().enumerate() {
        // a line below the running counter can only arrive with
        // validation skipped; it joins the current line unseparated
        if record.generated.line > prev_generated_line {
            prev_generated_col = 0;
            while record.generated.line > prev_generated_line {
                w.write_all(&[b';'])?;
                prev_generated_line += 1;
            }
        } else if idx != 0 {
            // a record identical in every field to its neighbor adds no
            // information; distinct records always survive
            if MappingRecord::cmp_by_generated(record, &records[idx - 1]).is_eq() {
                continue;
            }
            w.write_all(&[b','])?;
        }

        let mut encoder = VlqEncoder::new(w);

        encoder.encode(prev_generated_col, record.generated.column)?;
        prev_generated_col = record.generated.column;

        if let (Some(source), Some(original)) = (&record.source, record.original) {
            let source_id = sources.index_of(source).map_err(io::Error::other)?;
            encoder.encode(prev_source_id, source_id)?;
            prev_source_id = source_id;

            // original lines go on the wire 0-based
            let wire_line = original.line.saturating_sub(1);
            encoder.encode(prev_original_line, wire_line)?;
            prev_original_line = wire_line;

            encoder.encode(prev_original_col, original.column)?;
            prev_original_col = original.column;

            if let Some(name) = &record.name {
                let name_id = names.index_of(name).map_err(io::Error::other)?;
                encoder.encode(prev_name_id, name_id)?;
                prev_name_id = name_id;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Generator;
    use crate::mapping::Position;
    use crate::mapping_list::MappingRecord;

    #[test]
    fn test_serialize_minimal() {
        let mut generator = Generator::new().with_file("out.js");
        generator
            .add_mapping(MappingRecord::new(
                Position::new(1, 0),
                Position::new(5, 0),
                "x.ts",
                None,
            ))
            .unwrap();
        insta::assert_snapshot!(
            generator.to_string().unwrap(),
            @r#"{"version":3,"sources":["x.ts"],"names":[],"mappings":"AAIA","file":"out.js"}"#
        );
    }

    #[test]
    fn test_validation_rejects_partial_records() {
        let mut generator = Generator::new();
        // original position without a source
        let record = MappingRecord {
            generated: Position::new(1, 0),
            original: Some(Position::new(1, 0)),
            source: None,
            name: None,
        };
        assert!(generator.add_mapping(record).is_err());
        // name without an original side
        let record = MappingRecord {
            generated: Position::new(1, 0),
            original: None,
            source: None,
            name: Some("f".to_owned()),
        };
        assert!(generator.add_mapping(record).is_err());
        // generated-only records are fine
        assert!(generator
            .add_mapping(MappingRecord::generated_only(Position::new(1, 0)))
            .is_ok());
    }

    #[test]
    fn test_skip_validation() {
        let mut generator = Generator::new().with_skip_validation(true);
        let record = MappingRecord {
            generated: Position::new(0, 0),
            original: None,
            source: None,
            name: None,
        };
        assert!(generator.add_mapping(record).is_ok());
    }

    #[test]
    fn test_serialize_below_range_line() {
        // a line-0 record must not drive the line counter; it lands on
        // the first line without a separator
        let mut generator = Generator::new().with_skip_validation(true);
        generator
            .add_mapping(MappingRecord::generated_only(Position::new(0, 0)))
            .unwrap();
        insta::assert_snapshot!(
            generator.to_string().unwrap(),
            @r#"{"version":3,"sources":[],"names":[],"mappings":"A"}"#
        );

        generator
            .add_mapping(MappingRecord::generated_only(Position::new(1, 3)))
            .unwrap();
        insta::assert_snapshot!(
            generator.to_string().unwrap(),
            @r#"{"version":3,"sources":[],"names":[],"mappings":"A,G"}"#
        );
    }
}
