// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use crate::reads::Read;

/// How a read relates to the junction of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum SupportType {
    /// Soft clipped exactly at the junction.
    #[strum(serialize = "JUNCTION")]
    Junction,
    /// Mate of a junction read, contributes no bases.
    #[strum(serialize = "JUNCTION_MATE")]
    JunctionMate,
    /// Discordant pair anchored on the reference side, contributes no bases.
    #[strum(serialize = "DISCORDANT")]
    Discordant,
    /// CIGAR insertion or deletion abutting the junction.
    #[strum(serialize = "INDEL")]
    Indel,
    /// Read without a matching junction clip that agrees with the assembled sequence.
    #[strum(serialize = "CANDIDATE")]
    Candidate,
}

impl SupportType {
    pub fn contributes_bases(self) -> bool {
        matches!(
            self,
            SupportType::Junction | SupportType::Indel | SupportType::Candidate
        )
    }

    pub fn is_junction_support(self) -> bool {
        matches!(self, SupportType::Junction | SupportType::Indel)
    }
}

/// One read's alignment against an assembly.
///
/// Read indices are stored relative to the read; the assembly offset is derived from the
/// assembly's current junction index, so supports survive reallocation untouched.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct AssemblySupport {
    #[getset(get = "pub")]
    read: Arc<Read>,
    #[getset(get_copy = "pub")]
    support_type: SupportType,
    /// Index within the read's bases of the junction position.
    #[getset(get_copy = "pub")]
    junction_read_index: usize,
    /// Inclusive range of read indices that contributed bases.
    #[getset(get_copy = "pub")]
    read_index_range: Option<(usize, usize)>,
    #[getset(get_copy = "pub")]
    junction_mismatches: usize,
    #[getset(get_copy = "pub")]
    reference_mismatches: usize,
}

impl AssemblySupport {
    pub(crate) fn new(
        read: Arc<Read>,
        support_type: SupportType,
        junction_read_index: usize,
        read_index_range: Option<(usize, usize)>,
        junction_mismatches: usize,
    ) -> Self {
        AssemblySupport {
            read,
            support_type,
            junction_read_index,
            read_index_range,
            junction_mismatches,
            reference_mismatches: 0,
        }
    }

    pub(crate) fn without_bases(read: Arc<Read>, support_type: SupportType) -> Self {
        AssemblySupport::new(read, support_type, 0, None, 0)
    }

    /// Assembly offset of the first contributed base, given the assembly's junction index.
    /// Negative if the read starts before the assembled sequence.
    pub fn assembly_index(&self, junction_index: usize) -> Option<isize> {
        self.read_index_range.map(|(start, _)| {
            junction_index as isize + start as isize - self.junction_read_index as isize
        })
    }

    /// Number of read bases aligned to the assembly.
    pub fn aligned_length(&self) -> usize {
        self.read_index_range.map_or(0, |(start, end)| end - start + 1)
    }

    pub fn mismatch_count(&self) -> usize {
        self.junction_mismatches + self.reference_mismatches
    }

    pub(crate) fn widen_read_index_range(&mut self, start: usize, end: usize) {
        self.read_index_range = Some(match self.read_index_range {
            Some((s, e)) => (s.min(start), e.max(end)),
            None => (start, end),
        });
    }

    pub(crate) fn set_reference_mismatches(&mut self, mismatches: usize) {
        self.reference_mismatches = mismatches;
    }

    pub fn is_same_read(&self, read: &Arc<Read>) -> bool {
        Arc::ptr_eq(&self.read, read)
    }
}
