// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Tandem repeat annotation of base sequences.

use std::fmt;
use std::str;

use crate::utils::base_index;

/// Unit lengths to try at each position, with the minimum number of contiguous copies
/// required. Shorter units come first so that the simplest explanation of a run wins.
const UNIT_REQUIREMENTS: [(usize, usize); 4] = [(1, 4), (2, 3), (3, 2), (4, 2)];

/// A tandem repeat of `unit` occurring `count` times starting at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new, Getters, CopyGetters)]
pub struct RepeatInfo {
    #[getset(get_copy = "pub")]
    index: usize,
    #[getset(get = "pub")]
    unit: String,
    #[getset(get_copy = "pub")]
    count: usize,
}

impl RepeatInfo {
    pub fn length(&self) -> usize {
        self.count * self.unit.len()
    }

    /// Last index covered by the repeat.
    pub fn end_index(&self) -> usize {
        self.index + self.length() - 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.index && index <= self.end_index()
    }
}

impl fmt::Display for RepeatInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}x{}", self.index, self.unit, self.count)
    }
}

/// Scan `bases` left to right and report non-overlapping tandem repeats.
pub fn find_repeats(bases: &[u8]) -> Vec<RepeatInfo> {
    let mut repeats = Vec::new();
    let mut index = 0;

    while index < bases.len() {
        if let Some(repeat) = find_repeat_at(bases, index) {
            index += repeat.length();
            repeats.push(repeat);
        } else {
            index += 1;
        }
    }

    repeats
}

fn find_repeat_at(bases: &[u8], index: usize) -> Option<RepeatInfo> {
    for (unit_len, min_count) in UNIT_REQUIREMENTS.iter() {
        if index + unit_len * min_count > bases.len() {
            continue;
        }

        let unit = &bases[index..index + unit_len];
        if unit.iter().any(|b| base_index(*b).is_none()) {
            continue;
        }

        let count = count_unit_copies(bases, index, unit);
        if count >= *min_count {
            // unit only holds A, C, G or T here
            let unit = str::from_utf8(unit).unwrap_or_default().to_owned();
            return Some(RepeatInfo::new(index, unit, count));
        }
    }

    None
}

fn count_unit_copies(bases: &[u8], index: usize, unit: &[u8]) -> usize {
    bases[index..]
        .chunks_exact(unit.len())
        .take_while(|chunk| *chunk == unit)
        .count()
}

/// The repeat covering the most bases, earliest first on ties.
pub fn max_repeat(repeats: &[RepeatInfo]) -> Option<&RepeatInfo> {
    repeats.iter().fold(None, |best: Option<&RepeatInfo>, repeat| match best {
        Some(b) if b.length() >= repeat.length() => Some(b),
        _ => Some(repeat),
    })
}

/// Sequence length with every repeat collapsed to a single unit.
pub fn trimmed_length(bases: &[u8]) -> usize {
    let repeat_bases: usize = find_repeats(bases)
        .iter()
        .map(|repeat| repeat.length() - repeat.unit().len())
        .sum();
    bases.len() - repeat_bases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_repeat() {
        let repeats = find_repeats(b"ACACACG");
        assert_eq!(repeats, vec![RepeatInfo::new(0, "AC".to_owned(), 3)]);
        assert_eq!(repeats[0].length(), 6);
        assert_eq!(repeats[0].end_index(), 5);
    }

    #[test]
    fn test_single_base_repeat() {
        assert_eq!(
            find_repeats(b"AAAA"),
            vec![RepeatInfo::new(0, "A".to_owned(), 4)]
        );
        // three copies are not enough for a single base unit
        assert!(find_repeats(b"AAAC").is_empty());
    }

    #[test]
    fn test_prefers_shorter_unit() {
        // AT x3, not a longer unit
        let repeats = find_repeats(b"GATATATC");
        assert_eq!(repeats, vec![RepeatInfo::new(1, "AT".to_owned(), 3)]);
    }

    #[test]
    fn test_multiple_non_overlapping() {
        let repeats = find_repeats(b"TTTTTGCAGCAGCCCCAAAGTAAGTA");
        assert_eq!(
            repeats,
            vec![
                RepeatInfo::new(0, "T".to_owned(), 5),
                RepeatInfo::new(5, "GCA".to_owned(), 2),
                RepeatInfo::new(12, "C".to_owned(), 4),
                RepeatInfo::new(17, "AAGT".to_owned(), 2),
            ]
        );
    }

    #[test]
    fn test_unset_bases_are_ignored() {
        assert!(find_repeats(&[0, 0, 0, 0, 0]).is_empty());
        assert!(find_repeats(b"NNNNNN").is_empty());
    }

    #[test]
    fn test_max_repeat_and_trimmed_length() {
        let bases = b"GTTTTTTACACAC";
        let repeats = find_repeats(bases);
        assert_eq!(repeats.len(), 2);
        assert_eq!(max_repeat(&repeats).unwrap().unit(), "T");
        // 6 Ts collapse to 1, ACACAC collapses to AC
        assert_eq!(trimmed_length(bases), bases.len() - 5 - 4);
        assert!(max_repeat(&[]).is_none());
    }
}
