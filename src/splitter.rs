/// Splits a `mappings` string into segments, flagging line advances.
///
/// Yields one `(segment, ends_line)` pair per separator plus a final pair
/// for the trailing segment; empty segments are yielded too, since a bare
/// `;` still advances the generated line.
#[derive(Debug)]
pub(crate) struct MappingSplitter<'a> {
    rest: Option<&'a str>,
}

impl<'a> MappingSplitter<'a> {
    pub fn new(string: &'a str) -> Self {
        Self { rest: Some(string) }
    }
}

impl<'a> Iterator for MappingSplitter<'a> {
    // segment, next_new_line
    type Item = (&'a str, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        // both separators are ASCII, so slicing at the match is safe
        match memchr::memchr2(b';', b',', rest.as_bytes()) {
            Some(idx) => {
                self.rest = Some(&rest[idx + 1..]);
                Some((&rest[..idx], rest.as_bytes()[idx] == b';'))
            }
            None => {
                self.rest = None;
                Some((rest, false))
            }
        }
    }
}
