/// Tie-break direction used when a queried position has no exact mapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Bias {
    /// The closest entry at or before the needle.
    #[default]
    GreatestLowerBound,
    /// The closest entry at or after the needle.
    LeastUpperBound,
}

/// Biased binary search over a slice sorted by `key`.
///
/// The key is a coarse probe: entries may tie on it while differing in
/// later sort fields. On an exact match, or once the bias has picked a
/// neighbor, the result is walked back to the first entry of the run of
/// equal keys, so callers always land on a run's start. Returns `None`
/// when no entry exists on the biased side.
pub(crate) fn search<T, K, F>(items: &[T], needle: &K, key: F, bias: Bias) -> Option<usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    if items.is_empty() {
        return None;
    }

    let idx = match items.binary_search_by(|item| key(item).cmp(needle)) {
        Ok(idx) => idx,
        Err(insertion) => match bias {
            Bias::GreatestLowerBound => insertion.checked_sub(1)?,
            Bias::LeastUpperBound => {
                if insertion == items.len() {
                    return None;
                }
                insertion
            }
        },
    };

    let run_key = key(&items[idx]);
    let mut idx = idx;
    while idx > 0 && key(&items[idx - 1]) == run_key {
        idx -= 1;
    }
    Some(idx)
}
