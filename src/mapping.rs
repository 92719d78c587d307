use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};

/// A line/column pair.
///
/// Lines are 1-based and columns 0-based throughout this crate, for both
/// generated and original positions. Columns count bytes where text is
/// sliced (see [SourceNode](crate::SourceNode)).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl From<(u32, u32)> for Position {
    fn from((line, column): (u32, u32)) -> Self {
        Self::new(line, column)
    }
}

/// The original side of a mapping: an interned source id, a position in
/// that source, and an optional interned name id.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct OriginalLocation {
    pub source: u32,
    pub position: Position,
    pub name: Option<u32>,
}

/// One association between a generated position and, optionally, an
/// original one. Source, original line and original column travel together;
/// a name rides only on a mapping that has an original side.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Mapping {
    generated: Position,
    original: Option<OriginalLocation>,
}

impl Debug for Mapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.generated.line, self.generated.column)?;
        if let Some(original) = &self.original {
            write!(
                f,
                " -> {}:{}:{}",
                original.source, original.position.line, original.position.column,
            )?;
            if let Some(name) = original.name {
                write!(f, " ({name})")?;
            }
        }
        Ok(())
    }
}

impl Mapping {
    #[inline]
    pub const fn new(generated_line: u32, generated_column: u32) -> Self {
        Self {
            generated: Position::new(generated_line, generated_column),
            original: None,
        }
    }

    #[inline]
    pub const fn with_original(self, source: u32, line: u32, column: u32) -> Self {
        Self {
            original: Some(OriginalLocation {
                source,
                position: Position::new(line, column),
                name: None,
            }),
            ..self
        }
    }

    #[inline]
    pub const fn with_name(self, name: u32) -> Self {
        match self.original {
            Some(original) => Self {
                original: Some(OriginalLocation {
                    name: Some(name),
                    ..original
                }),
                ..self
            },
            None => self,
        }
    }

    #[inline]
    pub fn generated(&self) -> Position {
        self.generated
    }

    #[inline]
    pub fn original(&self) -> Option<&OriginalLocation> {
        self.original.as_ref()
    }

    #[inline]
    pub fn has_original(&self) -> bool {
        self.original.is_some()
    }

    /// The (source, original position) search key. Mappings without an
    /// original side key past every real source, so they sort last and
    /// never shadow a match.
    #[inline]
    pub(crate) fn original_key(&self) -> (u32, Position) {
        match &self.original {
            Some(original) => (original.source, original.position),
            None => (u32::MAX, Position::new(u32::MAX, u32::MAX)),
        }
    }
}

/// `None` sorts after every `Some`, mirroring how absent sources and names
/// compare in encoded maps.
#[inline]
pub(crate) fn cmp_opt<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

impl Mapping {
    /// Full generated-position order: generated line and column, then
    /// source, original line, original column and name as tie-breaks.
    pub(crate) fn cmp_by_generated(a: &Self, b: &Self) -> Ordering {
        a.generated
            .cmp(&b.generated)
            .then_with(|| cmp_opt(a.original.map(|o| o.source), b.original.map(|o| o.source)))
            .then_with(|| {
                cmp_opt(
                    a.original.map(|o| o.position),
                    b.original.map(|o| o.position),
                )
            })
            .then_with(|| cmp_opt(a.original.and_then(|o| o.name), b.original.and_then(|o| o.name)))
    }

    /// Original-position order: source, original line, original column,
    /// then generated column, generated line and name as tie-breaks.
    pub(crate) fn cmp_by_original(a: &Self, b: &Self) -> Ordering {
        cmp_opt(a.original.map(|o| o.source), b.original.map(|o| o.source))
            .then_with(|| {
                cmp_opt(
                    a.original.map(|o| o.position),
                    b.original.map(|o| o.position),
                )
            })
            .then_with(|| a.generated.column.cmp(&b.generated.column))
            .then_with(|| a.generated.line.cmp(&b.generated.line))
            .then_with(|| cmp_opt(a.original.and_then(|o| o.name), b.original.and_then(|o| o.name)))
    }
}

/// A consumer mapping with its source and name resolved to strings, as
/// yielded by [Consumer::mappings](crate::Consumer::mappings).
///
/// `source` is present exactly when `original` is.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResolvedMapping {
    pub generated: Position,
    pub source: Option<String>,
    pub original: Option<Position>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Mapping;
    use std::cmp::Ordering;

    #[test]
    fn test_generated_order_breaks_ties_on_original() {
        let a = Mapping::new(1, 4).with_original(0, 2, 0);
        let b = Mapping::new(1, 4).with_original(1, 1, 0);
        assert_eq!(Mapping::cmp_by_generated(&a, &b), Ordering::Less);
        // a generated-only mapping sorts after one carrying a source
        let c = Mapping::new(1, 4);
        assert_eq!(Mapping::cmp_by_generated(&c, &a), Ordering::Greater);
    }

    #[test]
    fn test_original_order_prefers_source_then_position() {
        let a = Mapping::new(9, 0).with_original(0, 5, 2);
        let b = Mapping::new(1, 0).with_original(0, 5, 3);
        assert_eq!(Mapping::cmp_by_original(&a, &b), Ordering::Less);
        // generated column breaks ties before generated line
        let c = Mapping::new(9, 1).with_original(0, 5, 2);
        let d = Mapping::new(1, 2).with_original(0, 5, 2);
        assert_eq!(Mapping::cmp_by_original(&c, &d), Ordering::Less);
    }
}
