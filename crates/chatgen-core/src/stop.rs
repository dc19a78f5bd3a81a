//! Stop-sequence detection over generated bytes.

/// Stop strings for one generation call: template defaults plus caller extras.
///
/// Empty strings are never stored. Duplicates are kept; they do not change
/// what [`scan`] reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopSet {
    stops: Vec<String>,
}

impl StopSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one stop string. Empty input is ignored.
    pub fn push<S: Into<String>>(&mut self, stop: S) {
        let stop = stop.into();
        if !stop.is_empty() {
            self.stops.push(stop);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.stops.iter().map(String::as_str)
    }

    pub fn contains(&self, stop: &str) -> bool {
        self.stops.iter().any(|s| s == stop)
    }
}

impl<S: Into<String>> Extend<S> for StopSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for s in iter {
            self.push(s);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for StopSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = StopSet::new();
        set.extend(iter);
        set
    }
}

/// Outcome of scanning generated text against a [`StopSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopScan {
    /// Bytes of the text that may be shown to the caller.
    pub safe_len: usize,
    /// A stop string occurred in full; generation must end.
    pub halt: bool,
}

/// Compute how much of `text` is safe to emit and whether to halt.
///
/// Exact matches use the leftmost occurrence of each stop; `safe_len` is the
/// minimum across stops. A stop with no exact match still holds back the
/// whole text when the entire text is a strict prefix of it. Only the full
/// text is tried as a prefix, never an arbitrary suffix.
pub fn scan(text: impl AsRef<[u8]>, stops: &StopSet) -> StopScan {
    let text = text.as_ref();
    let mut safe_len = text.len();
    let mut halt = false;

    for stop in stops.iter() {
        let stop = stop.as_bytes();

        if let Some(pos) = find_bytes(text, stop) {
            safe_len = safe_len.min(pos);
            halt = true;
            continue;
        }

        if text.len() < stop.len() && stop.starts_with(text) {
            safe_len = 0;
        }
    }

    StopScan { safe_len, halt }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn stops(list: &[&str]) -> StopSet {
        list.iter().copied().collect()
    }

    #[test]
    fn partial_prefix_holds_everything_back() {
        let r = scan("Sto", &stops(&["Stop"]));
        assert_eq!(r, StopScan { safe_len: 0, halt: false });
    }

    #[test]
    fn exact_match_truncates_and_halts() {
        let r = scan("Hello there\n\n", &stops(&["\n\n"]));
        assert_eq!(r, StopScan { safe_len: 11, halt: true });
    }

    #[rstest]
    #[case("abcXYZdefUVW", &["UVW", "XYZ"], 3, true)]
    #[case("abab", &["ab"], 0, true)]
    #[case("hello", &["<|im_end|>"], 5, false)]
    #[case("<|im", &["<|im_end|>"], 0, false)]
    #[case("x<|im", &["<|im_end|>"], 5, false)]
    #[case("", &["stop"], 0, false)]
    #[case("Stop", &["Stop", "Sto"], 0, true)]
    fn scan_cases(
        #[case] text: &str,
        #[case] list: &[&str],
        #[case] safe_len: usize,
        #[case] halt: bool,
    ) {
        assert_eq!(scan(text, &stops(list)), StopScan { safe_len, halt });
    }

    #[test]
    fn empty_stops_are_dropped_and_duplicates_harmless() {
        let set = stops(&["", "END", "END"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("END"));
        assert_eq!(scan("xxENDyy", &set), StopScan { safe_len: 2, halt: true });
    }

    proptest! {
        #[test]
        fn safe_len_never_exceeds_text(text in ".{0,40}", list in proptest::collection::vec(".{0,6}", 0..4)) {
            let set: StopSet = list.iter().cloned().collect();
            let r = scan(&text, &set);
            prop_assert!(r.safe_len <= text.len());
        }

        #[test]
        fn safe_len_is_leftmost_occurrence(prefix in "[a-z]{0,12}", stop in "[A-Z]{1,4}", suffix in "[a-z]{0,12}") {
            let text = format!("{prefix}{stop}{suffix}");
            let set: StopSet = [stop.clone()].into_iter().collect();
            let r = scan(&text, &set);
            prop_assert!(r.halt);
            prop_assert_eq!(r.safe_len, text.find(&stop).unwrap());
        }
    }
}
