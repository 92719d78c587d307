//! A tree of text fragments annotated with original positions, for
//! emitting transformed text and its map in one pass.

use crate::consumer::{Consumer, IterOrder};
use crate::generator::Generator;
use crate::mapping::{Position, ResolvedMapping};
use crate::mapping_list::MappingRecord;
use crate::path;
use crate::{ParseResult, ValidateResult};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Display;

/// The original position a node's text came from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NodeTag {
    pub source: String,
    pub position: Position,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
enum Child {
    Text(String),
    Node(SourceNode),
}

/// An ordered tree of text fragments, each optionally tagged with the
/// original position it was produced from.
///
/// Build one up while emitting transformed text, or reconstruct one from
/// existing text and its consumer with
/// [from_text_and_consumer](Self::from_text_and_consumer); flatten it back
/// into text plus a fresh map with [to_text_and_map](Self::to_text_and_map).
#[derive(Debug, Clone, Default)]
pub struct SourceNode {
    tag: Option<NodeTag>,
    children: Vec<Child>,
    source_contents: HashMap<String, String>,
}

impl SourceNode {
    /// An untagged node; its own text counts as generated-only.
    pub fn new() -> Self {
        Self::default()
    }

    /// A node whose direct text children originate at `position` in
    /// `source`.
    pub fn tagged(source: impl Into<String>, position: Position, name: Option<String>) -> Self {
        Self {
            tag: Some(NodeTag {
                source: source.into(),
                position,
                name,
            }),
            children: Vec::new(),
            source_contents: HashMap::new(),
        }
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Child::Text(text));
        }
        self
    }

    pub fn add_node(&mut self, node: SourceNode) -> &mut Self {
        self.children.push(Child::Node(node));
        self
    }

    pub fn prepend_text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.insert(0, Child::Text(text));
        }
        self
    }

    pub fn prepend_node(&mut self, node: SourceNode) -> &mut Self {
        self.children.insert(0, Child::Node(node));
        self
    }

    pub fn set_source_content(&mut self, source: impl Into<String>, content: impl Into<String>) {
        self.source_contents.insert(source.into(), content.into());
    }

    /// Visits every text fragment in order with the tag of its owning node.
    fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a str, Option<&'a NodeTag>),
    {
        for child in &self.children {
            match child {
                Child::Text(text) => visit(text, self.tag.as_ref()),
                Child::Node(node) => node.walk(visit),
            }
        }
    }

    fn walk_source_contents<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a str, &'a str),
    {
        for child in &self.children {
            if let Child::Node(node) = child {
                node.walk_source_contents(visit);
            }
        }
        for (source, content) in &self.source_contents {
            visit(source, content);
        }
    }
}

impl Display for SourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for child in &self.children {
            match child {
                Child::Text(text) => f.write_str(text)?,
                Child::Node(node) => Display::fmt(node, f)?,
            }
        }
        Ok(())
    }
}

// lines are consumed front to back, so a taken slot is never revisited
fn shift_next_line(lines: &mut [String], index: &mut usize) -> String {
    match lines.get_mut(*index) {
        Some(line) => {
            *index += 1;
            std::mem::take(line)
        }
        None => String::new(),
    }
}

/// Splits off up to `len` leading bytes, backing up to a char boundary.
fn split_prefix(line: &mut String, len: usize) -> String {
    let mut len = len.min(line.len());
    while !line.is_char_boundary(len) {
        len -= 1;
    }
    let rest = line.split_off(len);
    std::mem::replace(line, rest)
}

fn add_attributed(
    node: &mut SourceNode,
    mapping: &ResolvedMapping,
    code: String,
    relative_base: Option<&str>,
) {
    match (&mapping.source, mapping.original) {
        (Some(source), Some(original)) => {
            let source = match relative_base {
                Some(base) => path::join(base, source),
                None => source.clone(),
            };
            let mut child = SourceNode::tagged(source, original, mapping.name.clone());
            child.add_text(code);
            node.add_node(child);
        }
        _ => {
            node.add_text(code);
        }
    }
}

impl SourceNode {
    /// Reconstructs an annotated tree from generated text and the consumer
    /// of its map.
    ///
    /// Text is attributed to whichever mapping most recently started
    /// before it; text before the first mapping, between a mapping's line
    /// and a later mapping's, or after the last one stays untagged.
    /// Sources and contents resolve against `relative_base` when given.
    pub fn from_text_and_consumer(
        text: &str,
        consumer: &Consumer,
        relative_base: Option<&str>,
    ) -> ParseResult<Self> {
        let mut node = SourceNode::new();
        let mut lines: Vec<String> = text.split_inclusive('\n').map(ToOwned::to_owned).collect();
        let mut index = 0usize;

        let mut last: Option<ResolvedMapping> = None;
        let mut last_line = 1u32;
        let mut last_col = 0u32;

        for mapping in consumer.mappings(IterOrder::Generated)? {
            if let Some(prev) = last.take() {
                if last_line < mapping.generated.line {
                    // the previous mapping gets the rest of its line; any
                    // further gap lines stay untagged below
                    let code = shift_next_line(&mut lines, &mut index);
                    add_attributed(&mut node, &prev, code, relative_base);
                    last_line += 1;
                    last_col = 0;
                } else {
                    let code = match lines.get_mut(index) {
                        Some(line) => split_prefix(
                            line,
                            mapping.generated.column.saturating_sub(last_col) as usize,
                        ),
                        None => String::new(),
                    };
                    last_col = mapping.generated.column;
                    add_attributed(&mut node, &prev, code, relative_base);
                    last = Some(mapping);
                    continue;
                }
            }

            while last_line < mapping.generated.line {
                let code = shift_next_line(&mut lines, &mut index);
                node.add_text(code);
                last_line += 1;
            }
            if last_col < mapping.generated.column {
                if let Some(line) = lines.get_mut(index) {
                    node.add_text(split_prefix(line, mapping.generated.column as usize));
                }
                last_col = mapping.generated.column;
            }
            last = Some(mapping);
        }

        if index < lines.len() {
            if let Some(prev) = last.take() {
                let code = shift_next_line(&mut lines, &mut index);
                add_attributed(&mut node, &prev, code, relative_base);
            }
            node.add_text(lines[index..].concat());
        }

        for source in consumer.sources() {
            if let Ok(Some(content)) = consumer.source_content_for(&source, true) {
                let content = content.to_owned();
                let key = match relative_base {
                    Some(base) => path::join(base, &source),
                    None => source,
                };
                node.set_source_content(key, content);
            }
        }

        Ok(node)
    }

    /// Flattens the tree into its text and a freshly generated map.
    ///
    /// A mapping is emitted whenever the tag changes between fragments,
    /// including tagged to untagged and back, and re-emitted after a
    /// newline inside a fragment so every generated line carries its own
    /// anchor. Newline columns count bytes.
    pub fn to_text_and_map(&self, file: Option<&str>) -> ValidateResult<(String, Generator)> {
        let mut generator = Generator::new();
        if let Some(file) = file {
            generator = generator.with_file(file);
        }

        let mut code = String::new();
        let mut line = 1u32;
        let mut column = 0u32;
        let mut active = false;
        let mut last_tag: Option<&NodeTag> = None;
        let mut result: ValidateResult<()> = Ok(());

        self.walk(&mut |chunk, tag| {
            if result.is_err() {
                return;
            }
            code.push_str(chunk);
            match tag {
                Some(tag) => {
                    if last_tag != Some(tag) {
                        result = generator.add_mapping(MappingRecord::new(
                            Position::new(line, column),
                            tag.position,
                            tag.source.clone(),
                            tag.name.clone(),
                        ));
                    }
                    last_tag = Some(tag);
                    active = true;
                }
                None => {
                    if active {
                        // close off the tagged run
                        result = generator
                            .add_mapping(MappingRecord::generated_only(Position::new(line, column)));
                    }
                    last_tag = None;
                    active = false;
                }
            }

            let bytes = chunk.as_bytes();
            for (idx, &byte) in bytes.iter().enumerate() {
                if byte == b'\n' {
                    line += 1;
                    column = 0;
                    if idx + 1 == bytes.len() {
                        // a chunk ending in a newline does not claim the
                        // next line
                        last_tag = None;
                        active = false;
                    } else if active {
                        if let (Some(tag), Ok(())) = (tag, &result) {
                            result = generator.add_mapping(MappingRecord::new(
                                Position::new(line, column),
                                tag.position,
                                tag.source.clone(),
                                tag.name.clone(),
                            ));
                        }
                    }
                } else {
                    column += 1;
                }
            }
        });
        result?;

        let mut contents: Vec<(String, String)> = Vec::new();
        self.walk_source_contents(&mut |source, content| {
            contents.push((source.to_owned(), content.to_owned()));
        });
        for (source, content) in contents {
            generator.set_source_content(&source, Some(content));
        }

        Ok((code, generator))
    }
}
