// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Chromosome naming and ordering helpers.

use std::cmp::Ordering;
use std::collections::HashMap;

lazy_static! {
    static ref NAMED_CHROMOSOME_RANKS: HashMap<&'static str, u32> =
        [("X", 23), ("Y", 24), ("M", 25), ("MT", 25)]
            .iter()
            .cloned()
            .collect();
}

/// Strip "chr" prefix, so both "chr1" and "1" normalize to "1".
pub(crate) fn normalize_chrom(chrom: &str) -> &str {
    chrom.trim_start_matches("chr")
}

/// Convert chromosome name to a sortable rank (natural human order).
/// Only chromosomes 1-22, X, Y and M/MT have a rank.
pub fn chrom_rank_checked(chrom: &str) -> Option<u32> {
    let s = normalize_chrom(chrom);
    match s.parse::<u32>() {
        Ok(n @ 1..=22) => Some(n),
        Ok(_) => None,
        Err(_) => NAMED_CHROMOSOME_RANKS.get(s).cloned(),
    }
}

/// Total order over chromosome names: ranked chromosomes first in natural order,
/// all others afterwards ordered by name.
pub fn compare_chromosomes(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (chrom_rank_checked(a), chrom_rank_checked(b)) {
        (Some(ra), Some(rb)) => ra.cmp(&rb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Distance between two positions, `None` across chromosomes.
pub fn position_distance(chrom_a: &str, pos_a: i32, chrom_b: &str, pos_b: i32) -> Option<i32> {
    if chrom_a == chrom_b {
        Some((pos_a - pos_b).abs())
    } else {
        None
    }
}

/// Whether two closed intervals overlap once each is padded by `margin`.
pub fn positions_overlap(start_a: i32, end_a: i32, start_b: i32, end_b: i32, margin: i32) -> bool {
    start_a <= end_b + margin && end_a + margin >= start_b
}
