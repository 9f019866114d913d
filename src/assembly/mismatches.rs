// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Sparse ledger of bases that disagree with an assembly's consensus.
//!
//! Positions are offsets relative to the junction index, which keeps them valid when the
//! assembly arrays grow on the reference side.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::reads::Read;
use crate::utils::base_index;

/// Reads carrying one alternate base at one position.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct BaseMismatch {
    #[getset(get_copy = "pub")]
    base: u8,
    #[getset(get = "pub")]
    reads: Vec<Arc<Read>>,
    #[getset(get_copy = "pub")]
    qual_total: u32,
    #[getset(get_copy = "pub")]
    max_qual: u8,
}

impl BaseMismatch {
    fn new(base: u8) -> Self {
        BaseMismatch {
            base,
            reads: Vec::new(),
            qual_total: 0,
            max_qual: 0,
        }
    }

    fn add(&mut self, read: &Arc<Read>, qual: u8) {
        self.reads.push(Arc::clone(read));
        self.qual_total += qual as u32;
        self.max_qual = self.max_qual.max(qual);
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    pub fn contains_read(&self, read: &Arc<Read>) -> bool {
        self.reads.iter().any(|r| Arc::ptr_eq(r, read))
    }
}

/// One slot per base letter.
#[derive(Debug, Clone, Default)]
pub struct BaseMismatches {
    mismatches: [Option<BaseMismatch>; 4],
}

impl BaseMismatches {
    fn add(&mut self, base: u8, read: &Arc<Read>, qual: u8) -> bool {
        match base_index(base) {
            Some(slot) => {
                self.mismatches[slot]
                    .get_or_insert_with(|| BaseMismatch::new(base.to_ascii_uppercase()))
                    .add(read, qual);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, base: u8) -> Option<&BaseMismatch> {
        base_index(base).and_then(|slot| self.mismatches[slot].as_ref())
    }

    /// Alternate bases in A, C, G, T order.
    pub fn iter(&self) -> impl Iterator<Item = &BaseMismatch> {
        self.mismatches.iter().filter_map(|m| m.as_ref())
    }

    pub fn read_count(&self) -> usize {
        self.iter().map(|m| m.read_count()).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequenceMismatches {
    positions: Option<BTreeMap<i32, BaseMismatches>>,
}

impl SequenceMismatches {
    /// Record that `read` has `base` at the junction-relative `offset`. Bases other than
    /// A, C, G and T are not tracked.
    pub fn add(&mut self, offset: i32, base: u8, read: &Arc<Read>, qual: u8) {
        if base_index(base).is_none() {
            return;
        }
        self.positions
            .get_or_insert_with(BTreeMap::new)
            .entry(offset)
            .or_default()
            .add(base, read, qual);
    }

    pub fn is_empty(&self) -> bool {
        self.positions.as_ref().map_or(true, |p| p.is_empty())
    }

    pub fn position_count(&self) -> usize {
        self.positions.as_ref().map_or(0, |p| p.len())
    }

    /// Number of distinct (position, base) pairs.
    pub fn distinct_count(&self) -> usize {
        self.iter().map(|(_, m)| m.iter().count()).sum()
    }

    pub fn get(&self, offset: i32) -> Option<&BaseMismatches> {
        self.positions.as_ref().and_then(|p| p.get(&offset))
    }

    /// Positions in ascending offset order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &BaseMismatches)> {
        self.positions
            .iter()
            .flat_map(|p| p.iter())
            .map(|(offset, mismatches)| (*offset, mismatches))
    }

    /// Offsets at which `read` was recorded as mismatching.
    pub fn read_offsets(&self, read: &Arc<Read>) -> Vec<i32> {
        self.iter()
            .filter(|(_, m)| m.iter().any(|bm| bm.contains_read(read)))
            .map(|(offset, _)| offset)
            .collect()
    }
}
