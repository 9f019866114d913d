// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashSet;
use std::sync::Arc;

use crate::assembly::JunctionAssembly;
use crate::config::AssemblyConfig;
use crate::junction::{Junction, Orientation};
use crate::reads::Read;
use crate::utils::genomics::positions_overlap;

/// Discordant pairs without assembly support that agree on both their local and their mate
/// location.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct DiscordantGroup {
    #[getset(get = "pub")]
    chromosome: String,
    #[getset(get_copy = "pub")]
    min_position: i32,
    #[getset(get_copy = "pub")]
    max_position: i32,
    /// Strand of the reads, the direction in which their breakpoint lies.
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    #[getset(get = "pub")]
    remote_chromosome: String,
    #[getset(get_copy = "pub")]
    remote_min_position: i32,
    #[getset(get_copy = "pub")]
    remote_max_position: i32,
    #[getset(get_copy = "pub")]
    remote_orientation: Orientation,
    #[getset(get = "pub")]
    reads: Vec<Arc<Read>>,
}

fn mate_orientation(read: &Read) -> Orientation {
    if read.is_mate_reverse_strand() {
        Orientation::Reverse
    } else {
        Orientation::Forward
    }
}

impl DiscordantGroup {
    fn new(read: Arc<Read>) -> Option<Self> {
        let remote_chromosome = read.mate_chromosome().clone()?;
        let remote_min_position = read.mate_alignment_start()?;
        let remote_max_position = read.mate_alignment_end()?;
        Some(DiscordantGroup {
            chromosome: read.chromosome().clone(),
            min_position: read.alignment_start(),
            max_position: read.alignment_end(),
            orientation: read.orientation(),
            remote_chromosome,
            remote_min_position,
            remote_max_position,
            remote_orientation: mate_orientation(&read),
            reads: vec![read],
        })
    }

    fn accepts(&self, read: &Read, max_distance: i32) -> bool {
        let remote_matches = match (
            read.mate_chromosome(),
            read.mate_alignment_start(),
            read.mate_alignment_end(),
        ) {
            (Some(chromosome), Some(start), Some(end)) => {
                *chromosome == self.remote_chromosome
                    && mate_orientation(read) == self.remote_orientation
                    && positions_overlap(
                        start,
                        end,
                        self.remote_min_position,
                        self.remote_max_position,
                        max_distance,
                    )
            }
            _ => false,
        };
        remote_matches
            && *read.chromosome() == self.chromosome
            && read.orientation() == self.orientation
            && positions_overlap(
                read.alignment_start(),
                read.alignment_end(),
                self.min_position,
                self.max_position,
                max_distance,
            )
    }

    fn add(&mut self, read: Arc<Read>) {
        self.min_position = self.min_position.min(read.alignment_start());
        self.max_position = self.max_position.max(read.alignment_end());
        if let (Some(start), Some(end)) = (read.mate_alignment_start(), read.mate_alignment_end()) {
            self.remote_min_position = self.remote_min_position.min(start);
            self.remote_max_position = self.remote_max_position.max(end);
        }
        self.reads.push(read);
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// Whether the reads point at `junction` from its reference side, within `max_distance`.
    pub fn points_to(&self, junction: &Junction, max_distance: i32) -> bool {
        if *junction.chromosome() != self.chromosome || junction.orientation() != self.orientation
        {
            return false;
        }
        match self.orientation {
            Orientation::Forward => {
                junction.position() >= self.max_position
                    && junction.position() - self.max_position <= max_distance
            }
            Orientation::Reverse => {
                junction.position() <= self.min_position
                    && self.min_position - junction.position() <= max_distance
            }
        }
    }
}

/// Cluster the discordant reads that support none of the assemblies. Groups with fewer than
/// the configured minimum number of reads are dropped.
pub fn build_discordant_groups(
    reads: &[Arc<Read>],
    assemblies: &[JunctionAssembly],
    config: &AssemblyConfig,
) -> Vec<DiscordantGroup> {
    let supporting: HashSet<&str> = assemblies
        .iter()
        .flat_map(|assembly| assembly.support_reads())
        .map(|read| read.id().as_str())
        .collect();

    let mut candidates: Vec<&Arc<Read>> = reads
        .iter()
        .filter(|read| read.is_discordant(config.max_fragment_length))
        .filter(|read| !supporting.contains(read.id().as_str()))
        .collect();
    candidates.sort_by_key(|read| (read.chromosome().clone(), read.alignment_start()));

    let mut groups: Vec<DiscordantGroup> = Vec::new();
    for read in candidates {
        match groups
            .iter_mut()
            .find(|group| group.accepts(read, config.max_fragment_length))
        {
            Some(group) => group.add(Arc::clone(read)),
            None => groups.extend(DiscordantGroup::new(Arc::clone(read))),
        }
    }

    groups.retain(|group| group.read_count() >= config.discordant_group_min_reads);
    debug!("built {} discordant groups", groups.len());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::ReadBuilder;
    use rust_htslib::bam::record::{Cigar, CigarString};

    fn discordant(id: &str, start: i32, mate_start: i32) -> Arc<Read> {
        Arc::new(
            ReadBuilder::default()
                .id(id)
                .chromosome("1")
                .bases(vec![b'A'; 50])
                .base_quals(vec![30; 50])
                .alignment_start(start)
                .cigar(CigarString(vec![Cigar::Match(50)]))
                .is_paired(true)
                .mate_chromosome("7")
                .mate_alignment_start(mate_start)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_build_discordant_groups() {
        let reads = vec![
            discordant("a", 1000, 50000),
            discordant("b", 1100, 50200),
            discordant("c", 1150, 90000),
            discordant("d", 8000, 50100),
        ];
        let groups = build_discordant_groups(&reads, &[], &AssemblyConfig::default());
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.read_count(), 2);
        assert_eq!((group.min_position(), group.max_position()), (1000, 1149));
        assert_eq!(group.remote_chromosome(), "7");
        assert_eq!(group.orientation(), Orientation::Forward);

        assert!(group.points_to(&Junction::forward("1", 1500), 1000));
        assert!(!group.points_to(&Junction::forward("1", 1100), 1000));
        assert!(!group.points_to(&Junction::reverse("1", 1500), 1000));
        assert!(!group.points_to(&Junction::forward("1", 2150), 1000));
    }
}
