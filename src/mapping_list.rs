use crate::mapping::{cmp_opt, Position};
use std::cmp::Ordering;

/// One mapping as fed into a [Generator](crate::Generator): resolved
/// source/name strings instead of interned indices.
///
/// Either no original-side field is present, or `original` and `source`
/// are both present; `name` additionally requires an original side.
/// [Generator::add_mapping](crate::Generator::add_mapping) enforces this.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MappingRecord {
    pub generated: Position,
    pub original: Option<Position>,
    pub source: Option<String>,
    pub name: Option<String>,
}

impl MappingRecord {
    pub fn generated_only(generated: Position) -> Self {
        Self {
            generated,
            original: None,
            source: None,
            name: None,
        }
    }

    pub fn new(
        generated: Position,
        original: Position,
        source: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            generated,
            original: Some(original),
            source: Some(source.into()),
            name,
        }
    }

    /// Full generated order over resolved records: generated position,
    /// then source, original position and name, absent fields last.
    pub(crate) fn cmp_by_generated(a: &Self, b: &Self) -> Ordering {
        a.generated
            .cmp(&b.generated)
            .then_with(|| cmp_opt(a.source.as_deref(), b.source.as_deref()))
            .then_with(|| cmp_opt(a.original, b.original))
            .then_with(|| cmp_opt(a.name.as_deref(), b.name.as_deref()))
    }
}

/// Accumulates mapping records, preserving sort order cheaply when
/// insertions already arrive in non-decreasing generated order.
///
/// If they do, [to_sorted](Self::to_sorted) costs nothing; otherwise the
/// records are stable-sorted once, lazily, on first serialization.
#[derive(Debug, Clone, Default)]
pub(crate) struct MappingList {
    items: Vec<MappingRecord>,
    sorted_up_to_push: bool,
    last: Option<Position>,
}

impl MappingList {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            sorted_up_to_push: true,
            last: None,
        }
    }

    pub fn push(&mut self, record: MappingRecord) {
        match self.last {
            Some(last) if last > record.generated => self.sorted_up_to_push = false,
            _ => self.last = Some(record.generated),
        }
        self.items.push(record);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MappingRecord> {
        self.items.iter_mut()
    }

    /// The records in generated order, sorting at most once.
    pub fn to_sorted(&mut self) -> &[MappingRecord] {
        if !self.sorted_up_to_push {
            self.items.sort_by(MappingRecord::cmp_by_generated);
            self.sorted_up_to_push = true;
        }
        &self.items
    }
}
