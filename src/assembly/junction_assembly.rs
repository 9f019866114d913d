// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::iter;
use std::sync::Arc;

use crate::assembly::mismatches::SequenceMismatches;
use crate::assembly::support::{AssemblySupport, SupportType};
use crate::assembly::AssemblyOutcome;
use crate::junction::{Junction, Orientation};
use crate::reads::Read;
use crate::remote::RemoteRegion;
use crate::utils::bases_to_string;
use crate::utils::repeats::{find_repeats, max_repeat, RepeatInfo};

/// Consensus sequence anchored at a junction.
///
/// Bases are stored in reference order. For a forward junction the reference side lies below
/// `junction_index` and the novel extension above it; a reverse junction is mirrored. A base
/// value of 0 marks a position no read has covered yet.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct JunctionAssembly {
    #[getset(get = "pub")]
    junction: Junction,
    #[getset(get = "pub")]
    bases: Vec<u8>,
    #[getset(get = "pub")]
    base_quals: Vec<u8>,
    #[getset(get = "pub")]
    base_qual_totals: Vec<u32>,
    #[getset(get_copy = "pub")]
    junction_index: usize,
    #[getset(get = "pub")]
    support: Vec<AssemblySupport>,
    #[getset(get = "pub")]
    mismatches: SequenceMismatches,
    #[getset(get = "pub")]
    repeat_info: Vec<RepeatInfo>,
    #[getset(get = "pub")]
    remote_regions: Vec<RemoteRegion>,
    /// Lowest reference position covered by an aligned support base.
    #[getset(get_copy = "pub")]
    min_aligned_position: i32,
    /// Highest reference position covered by an aligned support base.
    #[getset(get_copy = "pub")]
    max_aligned_position: i32,
    #[getset(get_copy = "pub")]
    phase_group: Option<usize>,
    #[getset(get_copy = "pub")]
    outcome: AssemblyOutcome,
    low_base_qual_threshold: u8,
}

impl JunctionAssembly {
    /// Create an assembly holding the junction base plus `extension_length` novel bases and
    /// seed it with `seed`. Returns `None` if the seed cannot be placed at the junction.
    pub fn new(
        junction: Junction,
        seed: Arc<Read>,
        seed_support_type: SupportType,
        extension_length: usize,
        low_base_qual_threshold: u8,
    ) -> Option<Self> {
        let length = extension_length + 1;
        let junction_index = match junction.orientation() {
            Orientation::Forward => 0,
            Orientation::Reverse => extension_length,
        };
        let position = junction.position();

        let mut assembly = JunctionAssembly {
            junction,
            bases: vec![0; length],
            base_quals: vec![0; length],
            base_qual_totals: vec![0; length],
            junction_index,
            support: Vec::new(),
            mismatches: SequenceMismatches::default(),
            repeat_info: Vec::new(),
            remote_regions: Vec::new(),
            min_aligned_position: position,
            max_aligned_position: position,
            phase_group: None,
            outcome: AssemblyOutcome::Unset,
            low_base_qual_threshold,
        };

        if assembly.add_read(seed, seed_support_type, false) {
            Some(assembly)
        } else {
            None
        }
    }

    /// Build an assembly from an ordered read set. The first read seeds the assembly, the
    /// others follow with mismatch registration. The extension covers the read reaching
    /// furthest into novel sequence.
    pub fn from_reads(
        junction: Junction,
        reads: &[(Arc<Read>, SupportType)],
        low_base_qual_threshold: u8,
    ) -> Option<Self> {
        let extension_length = reads
            .iter()
            .filter(|(_, support_type)| support_type.contributes_bases())
            .filter_map(|(read, _)| novel_extension(read, &junction))
            .max()?;
        let (seed, seed_support_type) = reads.first()?;

        let mut assembly = JunctionAssembly::new(
            junction,
            Arc::clone(seed),
            *seed_support_type,
            extension_length,
            low_base_qual_threshold,
        )?;
        for (read, support_type) in &reads[1..] {
            if support_type.contributes_bases() {
                assembly.add_read(Arc::clone(read), *support_type, true);
            } else {
                assembly.add_support_without_bases(Arc::clone(read), *support_type);
            }
        }
        Some(assembly)
    }

    pub fn length(&self) -> usize {
        self.bases.len()
    }

    /// Novel bases beyond the junction base.
    pub fn extension_length(&self) -> usize {
        match self.junction.orientation() {
            Orientation::Forward => self.bases.len() - 1 - self.junction_index,
            Orientation::Reverse => self.junction_index,
        }
    }

    /// Reference bases besides the junction base.
    pub fn reference_base_length(&self) -> usize {
        match self.junction.orientation() {
            Orientation::Forward => self.junction_index,
            Orientation::Reverse => self.bases.len() - 1 - self.junction_index,
        }
    }

    /// Novel bases in reference order, excluding the junction base.
    pub fn novel_bases(&self) -> &[u8] {
        match self.junction.orientation() {
            Orientation::Forward => &self.bases[self.junction_index + 1..],
            Orientation::Reverse => &self.bases[..self.junction_index],
        }
    }

    /// Reference bases in reference order, including the junction base.
    pub fn reference_bases(&self) -> &[u8] {
        match self.junction.orientation() {
            Orientation::Forward => &self.bases[..=self.junction_index],
            Orientation::Reverse => &self.bases[self.junction_index..],
        }
    }

    pub fn bases_string(&self) -> String {
        bases_to_string(&self.bases)
    }

    pub fn support_count(&self) -> usize {
        self.support.len()
    }

    pub fn junction_support_count(&self) -> usize {
        self.support
            .iter()
            .filter(|s| s.support_type().is_junction_support())
            .count()
    }

    pub fn support_reads(&self) -> impl Iterator<Item = &Arc<Read>> {
        self.support.iter().map(|s| s.read())
    }

    pub fn has_read(&self, read: &Arc<Read>) -> bool {
        self.support.iter().any(|s| s.is_same_read(read))
    }

    /// Whether any fragment supports both assemblies.
    pub fn shares_fragment(&self, other: &JunctionAssembly) -> bool {
        self.support_reads()
            .any(|read| other.support_reads().any(|o| read.matches_fragment(o)))
    }

    /// Offset of an array index relative to the junction index.
    fn junction_offset(&self, index: usize) -> i32 {
        index as i32 - self.junction_index as i32
    }

    fn assembly_index(&self, read_index: usize, junction_read_index: usize) -> Option<usize> {
        let index =
            self.junction_index as isize + read_index as isize - junction_read_index as isize;
        if index >= 0 && (index as usize) < self.bases.len() {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Inclusive read index range on the novel side of the junction, junction base included.
    fn junction_side_range(&self, read_length: usize, junction_read_index: usize) -> (usize, usize) {
        match self.junction.orientation() {
            Orientation::Forward => (junction_read_index, read_length - 1),
            Orientation::Reverse => (0, junction_read_index),
        }
    }

    /// Inclusive read index range on the reference side, junction base excluded.
    fn reference_side_range(
        &self,
        read_length: usize,
        junction_read_index: usize,
    ) -> Option<(usize, usize)> {
        match self.junction.orientation() {
            Orientation::Forward if junction_read_index > 0 => Some((0, junction_read_index - 1)),
            Orientation::Reverse if junction_read_index + 1 < read_length => {
                Some((junction_read_index + 1, read_length - 1))
            }
            _ => None,
        }
    }

    fn junction_read_index(&self, read: &Read) -> Option<usize> {
        if read.chromosome() != self.junction.chromosome() {
            return None;
        }
        read.read_index_at_reference_position(self.junction.position(), true)
    }

    /// Add the junction-side bases of `read` and record its support.
    ///
    /// Returns false if the read cannot be placed at the junction. Read bases falling outside
    /// the current arrays are skipped.
    pub fn add_read(
        &mut self,
        read: Arc<Read>,
        support_type: SupportType,
        register_mismatches: bool,
    ) -> bool {
        let junction_read_index = match self.junction_read_index(&read) {
            Some(index) => index,
            None => return false,
        };
        let (start, end) = self.junction_side_range(read.len(), junction_read_index);
        let (mismatches, applied) =
            self.add_read_bases(&read, start, end, junction_read_index, register_mismatches);

        self.support.push(AssemblySupport::new(
            read,
            support_type,
            junction_read_index,
            applied,
            mismatches,
        ));
        true
    }

    /// Record a read that supports the junction without contributing bases.
    pub fn add_support_without_bases(&mut self, read: Arc<Read>, support_type: SupportType) {
        self.support
            .push(AssemblySupport::without_bases(read, support_type));
    }

    /// Merge the reference-side bases of an existing support into the consensus, widening its
    /// read index range and replacing its reference mismatch count.
    pub(crate) fn add_support_reference_bases(
        &mut self,
        support_index: usize,
        register_mismatches: bool,
    ) {
        let (read, junction_read_index) = {
            let support = &self.support[support_index];
            (Arc::clone(support.read()), support.junction_read_index())
        };
        if let Some((start, end)) = self.reference_side_range(read.len(), junction_read_index) {
            let (mismatches, applied) =
                self.add_read_bases(&read, start, end, junction_read_index, register_mismatches);
            let support = &mut self.support[support_index];
            support.set_reference_mismatches(mismatches);
            if let Some((s, e)) = applied {
                support.widen_read_index_range(s, e);
            }
        }
    }

    /// Merge read bases `start..=end` into the consensus.
    ///
    /// Returns the number of mismatches and the read index range that fell within the arrays.
    fn add_read_bases(
        &mut self,
        read: &Arc<Read>,
        start: usize,
        end: usize,
        junction_read_index: usize,
        register_mismatches: bool,
    ) -> (usize, Option<(usize, usize)>) {
        let mut mismatches = 0;
        let mut applied: Option<(usize, usize)> = None;

        for read_index in start..=end {
            let index = match self.assembly_index(read_index, junction_read_index) {
                Some(index) => index,
                None => continue,
            };
            applied = Some(applied.map_or((read_index, read_index), |(s, _)| (s, read_index)));

            let base = read.bases()[read_index];
            let qual = read.base_quals()[read_index];
            let existing = self.bases[index];

            if existing == 0 {
                self.bases[index] = base;
                self.base_quals[index] = qual;
                self.base_qual_totals[index] = qual as u32;
            } else if existing == base || qual < self.low_base_qual_threshold {
                if qual > self.base_quals[index] {
                    self.base_quals[index] = qual;
                }
                self.base_qual_totals[index] += qual as u32;
            } else if self.base_quals[index] < self.low_base_qual_threshold {
                self.bases[index] = base;
                self.base_quals[index] = qual;
                self.base_qual_totals[index] += qual as u32;
            } else {
                mismatches += 1;
                if register_mismatches {
                    let offset = self.junction_offset(index);
                    self.mismatches.add(offset, base, read, qual);
                }
            }
        }

        (mismatches, applied)
    }

    /// Dry run of `add_read` over all read bases: true unless more than `permitted_mismatches`
    /// confident bases disagree with confident consensus bases.
    pub fn check_read_matches(&self, read: &Read, permitted_mismatches: usize) -> bool {
        let junction_read_index = match self.junction_read_index(read) {
            Some(index) => index,
            None => return false,
        };

        let mut mismatches = 0;
        for read_index in 0..read.len() {
            let index = match self.assembly_index(read_index, junction_read_index) {
                Some(index) => index,
                None => continue,
            };
            let existing = self.bases[index];
            if existing == 0 {
                continue;
            }
            let qual = read.base_quals()[read_index];
            if existing != read.bases()[read_index]
                && qual >= self.low_base_qual_threshold
                && self.base_quals[index] >= self.low_base_qual_threshold
            {
                mismatches += 1;
                if mismatches > permitted_mismatches {
                    return false;
                }
            }
        }

        true
    }

    /// Number of read bases that land on covered novel positions.
    pub fn novel_overlap(&self, read: &Read) -> usize {
        let junction_read_index = match self.junction_read_index(read) {
            Some(index) => index,
            None => return 0,
        };
        let (start, end) = self.junction_side_range(read.len(), junction_read_index);
        (start..=end)
            .filter(|read_index| *read_index != junction_read_index)
            .filter_map(|read_index| self.assembly_index(read_index, junction_read_index))
            .filter(|index| self.bases[*index] != 0)
            .count()
    }

    /// Grow the arrays into the reference side far enough for every supporting read and
    /// merge those reads' reference-side bases.
    ///
    /// The read with the fewest alignment events is merged first without registering
    /// mismatches and defines the reference baseline; all others follow with mismatch
    /// registration. The arrays never shrink and the junction index keeps pointing at the
    /// junction base.
    pub fn expand_reference_bases(&mut self) {
        let contributing: Vec<usize> = self
            .support
            .iter()
            .enumerate()
            .filter(|(_, s)| s.support_type().contributes_bases())
            .map(|(i, _)| i)
            .collect();
        if contributing.is_empty() {
            return;
        }

        let mut required = self.reference_base_length();
        for i in &contributing {
            let support = &self.support[*i];
            let read = support.read();
            let junction_read_index = support.junction_read_index();
            let reference_length = match self.junction.orientation() {
                Orientation::Forward => {
                    self.min_aligned_position =
                        self.min_aligned_position.min(read.alignment_start());
                    junction_read_index
                }
                Orientation::Reverse => {
                    self.max_aligned_position =
                        self.max_aligned_position.max(read.alignment_end());
                    read.len() - 1 - junction_read_index
                }
            };
            required = required.max(reference_length);
        }

        let current = self.reference_base_length();
        if required > current {
            let extra = required - current;
            match self.junction.orientation() {
                Orientation::Forward => {
                    self.bases.splice(0..0, iter::repeat(0).take(extra));
                    self.base_quals.splice(0..0, iter::repeat(0).take(extra));
                    self.base_qual_totals.splice(0..0, iter::repeat(0).take(extra));
                    self.junction_index += extra;
                }
                Orientation::Reverse => {
                    let length = self.bases.len() + extra;
                    self.bases.resize(length, 0);
                    self.base_quals.resize(length, 0);
                    self.base_qual_totals.resize(length, 0);
                }
            }
            debug!(
                "junction {} extended by {} reference bases to length {}",
                self.junction,
                extra,
                self.bases.len()
            );
        }

        let anchor = contributing
            .iter()
            .copied()
            .min_by_key(|i| self.support[*i].read().number_of_events());
        if let Some(anchor) = anchor {
            self.add_support_reference_bases(anchor, false);
            for i in contributing.into_iter().filter(|i| *i != anchor) {
                self.add_support_reference_bases(i, true);
            }
        }
    }

    /// Annotate the consensus with tandem repeats.
    pub fn build_repeat_info(&mut self) {
        self.repeat_info = find_repeats(&self.bases);
    }

    pub(crate) fn set_remote_regions(&mut self, remote_regions: Vec<RemoteRegion>) {
        self.remote_regions = remote_regions;
    }

    pub(crate) fn set_phase_group(&mut self, phase_group: Option<usize>) {
        self.phase_group = phase_group;
    }

    pub(crate) fn set_outcome(&mut self, outcome: AssemblyOutcome) {
        self.outcome = outcome;
    }
}

/// Number of read bases beyond the junction on its novel side.
pub(crate) fn novel_extension(read: &Read, junction: &Junction) -> Option<usize> {
    if read.chromosome() != junction.chromosome() {
        return None;
    }
    let junction_read_index = read.read_index_at_reference_position(junction.position(), true)?;
    Some(match junction.orientation() {
        Orientation::Forward => read.len() - 1 - junction_read_index,
        Orientation::Reverse => junction_read_index,
    })
}

/// The novel bases of a read in reference order.
pub(crate) fn novel_read_bases<'a>(read: &'a Read, junction: &Junction) -> Option<&'a [u8]> {
    let extension = novel_extension(read, junction)?;
    Some(match junction.orientation() {
        Orientation::Forward => &read.bases()[read.len() - extension..],
        Orientation::Reverse => &read.bases()[..extension],
    })
}

impl fmt::Display for JunctionAssembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "junction({}) length({}) extension({}) support({}) mismatches({})",
            self.junction,
            self.length(),
            self.extension_length(),
            self.support_count(),
            self.mismatches.position_count()
        )?;
        if let Some(repeat) = max_repeat(&self.repeat_info) {
            write!(f, " repeat({})", repeat)?;
        }
        Ok(())
    }
}
