// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use itertools::Itertools;

use crate::junction::Junction;
use crate::reads::Read;
use crate::utils::genomics::positions_overlap;

/// Junctions on one chromosome close enough to share their candidate reads.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct JunctionGroup {
    #[getset(get = "pub")]
    chromosome: String,
    #[getset(get = "pub")]
    junctions: Vec<Junction>,
    #[getset(get_copy = "pub")]
    min_position: i32,
    #[getset(get_copy = "pub")]
    max_position: i32,
    #[getset(get = "pub")]
    candidate_reads: Vec<Arc<Read>>,
}

impl JunctionGroup {
    pub fn new(junction: Junction) -> Self {
        JunctionGroup {
            chromosome: junction.chromosome().to_owned(),
            min_position: junction.position(),
            max_position: junction.position(),
            junctions: vec![junction],
            candidate_reads: Vec::new(),
        }
    }

    fn accepts(&self, junction: &Junction, max_distance: i32) -> bool {
        *junction.chromosome() == self.chromosome
            && junction.position() - self.max_position <= max_distance
    }

    fn push(&mut self, junction: Junction) {
        self.min_position = self.min_position.min(junction.position());
        self.max_position = self.max_position.max(junction.position());
        self.junctions.push(junction);
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    pub fn add_candidate_read(&mut self, read: Arc<Read>) {
        self.candidate_reads.push(read);
    }

    /// Whether a read lies within `window` of the group span.
    pub fn overlaps_read(&self, read: &Read, window: i32) -> bool {
        *read.chromosome() == self.chromosome
            && positions_overlap(
                read.unclipped_start(),
                read.unclipped_end(),
                self.min_position,
                self.max_position,
                window,
            )
    }

    /// Candidate reads within `window` of one of the group's junctions.
    pub fn candidate_reads_for(&self, junction: &Junction, window: i32) -> Vec<Arc<Read>> {
        self.candidate_reads
            .iter()
            .filter(|read| {
                *read.chromosome() == *junction.chromosome()
                    && positions_overlap(
                        read.unclipped_start(),
                        read.unclipped_end(),
                        junction.position(),
                        junction.position(),
                        window,
                    )
            })
            .cloned()
            .collect()
    }
}

/// Group junctions in a single pass over their sorted order. A new group starts whenever the
/// chromosome changes or the gap to the current group's maximum position exceeds `max_distance`.
pub fn build_junction_groups(junctions: &[Junction], max_distance: i32) -> Vec<JunctionGroup> {
    let mut groups: Vec<JunctionGroup> = Vec::new();

    for junction in junctions.iter().sorted() {
        match groups.last_mut() {
            Some(group) if group.accepts(junction, max_distance) => group.push(junction.clone()),
            _ => groups.push(JunctionGroup::new(junction.clone())),
        }
    }

    groups
}

/// Hand every read to each group whose span it falls into (within `window`).
pub fn assign_candidate_reads(groups: &mut [JunctionGroup], reads: &[Arc<Read>], window: i32) {
    for read in reads {
        for group in groups.iter_mut().filter(|g| g.overlaps_read(read, window)) {
            group.add_candidate_read(Arc::clone(read));
        }
    }
}
