// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Remote regions: the genomic intervals where the mates and supplementary alignments of an
//! assembly's reads are anchored.

use std::collections::BTreeSet;
use std::ops::Range;

use bio_types::genome::{AbstractInterval, Position};

use crate::assembly::{JunctionAssembly, SupportType};
use crate::config::AssemblyConfig;
use crate::junction::Orientation;
use crate::reads::Read;
use crate::utils::genomics::{compare_chromosomes, positions_overlap};

/// Kind of evidence anchoring a read in a remote region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum RemoteReadType {
    #[strum(serialize = "MATE")]
    Mate,
    #[strum(serialize = "SUPPLEMENTARY")]
    Supplementary,
    #[strum(serialize = "DISCORDANT")]
    Discordant,
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct RemoteRegion {
    #[getset(get = "pub")]
    chromosome: String,
    #[getset(get_copy = "pub")]
    start: i32,
    #[getset(get_copy = "pub")]
    end: i32,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    #[getset(get = "pub")]
    read_ids: BTreeSet<String>,
    #[getset(get_copy = "pub")]
    mate_count: usize,
    #[getset(get_copy = "pub")]
    supplementary_count: usize,
    #[getset(get_copy = "pub")]
    discordant_count: usize,
    /// Sum of mapping quality times soft clip length over the contributing reads.
    #[getset(get_copy = "pub")]
    soft_clip_map_qual_total: u32,
}

impl RemoteRegion {
    pub fn new(
        chromosome: &str,
        start: i32,
        end: i32,
        orientation: Orientation,
        read_id: &str,
        read_type: RemoteReadType,
        soft_clip_map_qual: u32,
    ) -> Self {
        let mut region = RemoteRegion {
            chromosome: chromosome.to_owned(),
            start,
            end,
            orientation,
            read_ids: BTreeSet::new(),
            mate_count: 0,
            supplementary_count: 0,
            discordant_count: 0,
            soft_clip_map_qual_total: 0,
        };
        region.add_read(read_id, read_type, start, end, soft_clip_map_qual);
        region
    }

    /// Widen the region to cover `start..=end` and count the read.
    pub fn add_read(
        &mut self,
        read_id: &str,
        read_type: RemoteReadType,
        start: i32,
        end: i32,
        soft_clip_map_qual: u32,
    ) {
        self.start = self.start.min(start);
        self.end = self.end.max(end);
        self.read_ids.insert(read_id.to_owned());
        match read_type {
            RemoteReadType::Mate => self.mate_count += 1,
            RemoteReadType::Supplementary => self.supplementary_count += 1,
            RemoteReadType::Discordant => self.discordant_count += 1,
        }
        self.soft_clip_map_qual_total += soft_clip_map_qual;
    }

    pub fn read_count(&self) -> usize {
        self.mate_count + self.supplementary_count + self.discordant_count
    }

    pub fn non_supplementary_count(&self) -> usize {
        self.mate_count + self.discordant_count
    }

    /// All evidence comes from supplementary alignments.
    pub fn is_supp_only(&self) -> bool {
        self.supplementary_count > 0 && self.non_supplementary_count() == 0
    }

    pub fn overlaps_position(&self, chromosome: &str, position: i32, margin: i32) -> bool {
        self.chromosome == chromosome
            && positions_overlap(self.start, self.end, position, position, margin)
    }

    pub fn overlaps(&self, other: &RemoteRegion, margin: i32) -> bool {
        self.chromosome == other.chromosome
            && positions_overlap(self.start, self.end, other.start, other.end, margin)
    }

    /// Absorb `other`: union of the intervals, sums of the counts and read ids.
    pub fn merge(&mut self, other: RemoteRegion) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
        self.read_ids.extend(other.read_ids);
        self.mate_count += other.mate_count;
        self.supplementary_count += other.supplementary_count;
        self.discordant_count += other.discordant_count;
        self.soft_clip_map_qual_total += other.soft_clip_map_qual_total;
    }
}

impl AbstractInterval for RemoteRegion {
    fn contig(&self) -> &str {
        &self.chromosome
    }

    /// Zero-based, half-open.
    fn range(&self) -> Range<Position> {
        (self.start.max(1) - 1) as Position..self.end.max(0) as Position
    }
}

/// Merge regions sharing chromosome and orientation whose intervals lie within `margin` of
/// each other. The result is sorted by chromosome and start.
pub fn merge_regions(mut regions: Vec<RemoteRegion>, margin: i32) -> Vec<RemoteRegion> {
    regions.sort_by(|a, b| {
        compare_chromosomes(&a.chromosome, &b.chromosome).then_with(|| a.start.cmp(&b.start))
    });

    let mut merged: Vec<RemoteRegion> = Vec::with_capacity(regions.len());
    for region in regions {
        match merged
            .iter_mut()
            .rev()
            .find(|m| m.orientation == region.orientation && m.overlaps(&region, margin))
        {
            Some(existing) => existing.merge(region),
            None => merged.push(region),
        }
    }
    merged
}

/// Drop supplementary-only regions that are weak both in read volume, relative to the total
/// non-supplementary support, and in soft clip weighted mapping quality, relative to the
/// strongest region. Either measure reaching `min_fraction` keeps a region.
pub fn purge_weak_supplementary_regions(regions: &mut Vec<RemoteRegion>, min_fraction: f64) {
    let max_qual = regions
        .iter()
        .map(|region| region.soft_clip_map_qual_total)
        .max()
        .unwrap_or(0);
    let total_non_supp: usize = regions.iter().map(|r| r.non_supplementary_count()).sum();
    if total_non_supp == 0 {
        return;
    }

    let before = regions.len();
    regions.retain(|region| {
        if !region.is_supp_only() {
            return true;
        }
        let read_share = region.read_count() as f64 / total_non_supp as f64;
        let qual_share = if max_qual > 0 {
            region.soft_clip_map_qual_total as f64 / max_qual as f64
        } else {
            0.0
        };
        read_share >= min_fraction || qual_share >= min_fraction
    });
    if regions.len() < before {
        debug!(
            "purged {} weak supplementary-only remote regions",
            before - regions.len()
        );
    }
}

fn soft_clip_map_qual(read: &Read, orientation: Orientation, mapping_quality: u8) -> u32 {
    mapping_quality as u32 * read.clip_length_towards(orientation) as u32
}

fn mate_is_remote(read: &Read, max_fragment_length: i32) -> bool {
    if !read.has_mapped_mate() {
        return false;
    }
    match (read.mate_chromosome(), read.mate_alignment_start()) {
        (Some(chromosome), Some(start)) => {
            chromosome != read.chromosome()
                || (start - read.alignment_start()).abs() > max_fragment_length
        }
        _ => false,
    }
}

fn add_to_regions(
    regions: &mut Vec<RemoteRegion>,
    chromosome: &str,
    start: i32,
    end: i32,
    orientation: Orientation,
    read_id: &str,
    read_type: RemoteReadType,
    soft_clip_map_qual: u32,
) {
    let existing = regions.iter_mut().find(|region| {
        region.orientation == orientation
            && region.chromosome == chromosome
            && positions_overlap(region.start, region.end, start, end, 0)
    });
    match existing {
        Some(region) => region.add_read(read_id, read_type, start, end, soft_clip_map_qual),
        None => regions.push(RemoteRegion::new(
            chromosome,
            start,
            end,
            orientation,
            read_id,
            read_type,
            soft_clip_map_qual,
        )),
    }
}

/// Gather the remote anchors of an assembly's reads, then merge and purge them.
///
/// Supplementary alignments come from the SA tag of any supporting read. Mates count for
/// base-contributing reads whose mate lies on another chromosome or beyond the fragment
/// length. Discordant supports always contribute their mate.
pub fn collect_remote_regions(
    assembly: &JunctionAssembly,
    config: &AssemblyConfig,
) -> Vec<RemoteRegion> {
    let orientation = assembly.junction().orientation();
    let mut regions = Vec::new();

    for support in assembly.support() {
        let read = support.read();
        let support_type = support.support_type();
        if support_type == SupportType::JunctionMate {
            continue;
        }

        if let Some(supplementary) = read.supplementary_alignment() {
            add_to_regions(
                &mut regions,
                supplementary.chromosome(),
                supplementary.position(),
                supplementary.alignment_end(),
                supplementary.orientation(),
                read.id(),
                RemoteReadType::Supplementary,
                soft_clip_map_qual(read, orientation, supplementary.mapping_quality()),
            );
        }

        let mate_type = match support_type {
            SupportType::Discordant => Some(RemoteReadType::Discordant),
            _ if mate_is_remote(read, config.max_fragment_length) => Some(RemoteReadType::Mate),
            _ => None,
        };
        if let (Some(read_type), Some(chromosome), Some(start), Some(end)) = (
            mate_type,
            read.mate_chromosome(),
            read.mate_alignment_start(),
            read.mate_alignment_end(),
        ) {
            let mate_orientation = if read.is_mate_reverse_strand() {
                Orientation::Reverse
            } else {
                Orientation::Forward
            };
            add_to_regions(
                &mut regions,
                chromosome,
                start,
                end,
                mate_orientation,
                read.id(),
                read_type,
                soft_clip_map_qual(read, orientation, read.mapping_quality()),
            );
        }
    }

    let mut regions = merge_regions(regions, config.remote_region_merge_margin);
    purge_weak_supplementary_regions(&mut regions, config.remote_region_weak_supp_fraction);
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junction::Junction;
    use crate::reads::{ReadBuilder, SupplementaryAlignment};
    use rust_htslib::bam::record::{Cigar, CigarString};
    use std::sync::Arc;

    fn region(read_count: usize, read_type: RemoteReadType, qual: u32) -> RemoteRegion {
        let mut region = RemoteRegion::new("2", 1000, 1100, Orientation::Forward, "r0", read_type, qual);
        for i in 1..read_count {
            region.add_read(&format!("r{}", i), read_type, 1000, 1100, 0);
        }
        region
    }

    #[test]
    fn test_region_accumulation() {
        let mut region =
            RemoteRegion::new("2", 1000, 1100, Orientation::Reverse, "a", RemoteReadType::Mate, 10);
        region.add_read("b", RemoteReadType::Supplementary, 900, 1050, 5);
        assert_eq!(region.start(), 900);
        assert_eq!(region.end(), 1100);
        assert_eq!(region.read_count(), 2);
        assert_eq!(region.non_supplementary_count(), 1);
        assert!(!region.is_supp_only());
        assert_eq!(region.soft_clip_map_qual_total(), 15);
        assert!(region.overlaps_position("2", 1150, 50));
        assert!(!region.overlaps_position("2", 1151, 50));
        assert!(!region.overlaps_position("3", 1000, 50));
        assert_eq!(region.range(), 899..1100);
        assert_eq!(region.contig(), "2");
    }

    #[test]
    fn test_merge_regions() {
        let regions = vec![
            RemoteRegion::new("2", 5000, 5100, Orientation::Forward, "c", RemoteReadType::Mate, 0),
            RemoteRegion::new("2", 1000, 1100, Orientation::Forward, "a", RemoteReadType::Mate, 0),
            RemoteRegion::new("2", 1400, 1500, Orientation::Forward, "b", RemoteReadType::Discordant, 0),
            RemoteRegion::new("2", 1200, 1300, Orientation::Reverse, "d", RemoteReadType::Mate, 0),
            RemoteRegion::new("1", 1200, 1300, Orientation::Forward, "e", RemoteReadType::Mate, 0),
        ];
        let merged = merge_regions(regions, 500);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged[0].chromosome(), "1");
        let forward = &merged[1];
        assert_eq!((forward.start(), forward.end()), (1000, 1500));
        assert_eq!(forward.read_count(), 2);
        assert_eq!(forward.discordant_count(), 1);
        assert_eq!(merged[2].orientation(), Orientation::Reverse);
        assert_eq!(merged[3].start(), 5000);
    }

    #[test]
    fn test_purge_weak_supplementary_regions() {
        let strong = region(10, RemoteReadType::Mate, 1000);

        let mut regions = vec![strong.clone(), region(1, RemoteReadType::Supplementary, 50)];
        purge_weak_supplementary_regions(&mut regions, 0.3);
        assert_eq!(regions.len(), 1);
        assert!(!regions[0].is_supp_only());

        let mut regions = vec![strong.clone(), region(4, RemoteReadType::Supplementary, 50)];
        purge_weak_supplementary_regions(&mut regions, 0.3);
        assert_eq!(regions.len(), 2);

        // strong mapping quality alone also suffices
        let mut regions = vec![strong, region(1, RemoteReadType::Supplementary, 400)];
        purge_weak_supplementary_regions(&mut regions, 0.3);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_collect_remote_regions() {
        let junction_read = |id: &str, sa: Option<&str>, mate: (&str, i32)| {
            let mut builder = ReadBuilder::default();
            builder
                .id(id)
                .chromosome("1")
                .bases(vec![b'A'; 50])
                .base_quals(vec![30; 50])
                .alignment_start(101)
                .cigar(CigarString(vec![Cigar::Match(10), Cigar::SoftClip(40)]))
                .mapping_quality(60)
                .is_paired(true)
                .is_mate_reverse_strand(true)
                .mate_chromosome(mate.0)
                .mate_alignment_start(mate.1);
            if let Some(sa) = sa {
                builder.supplementary_alignment(SupplementaryAlignment::parse(id, sa).unwrap());
            }
            Arc::new(builder.build().unwrap())
        };

        let reads = vec![
            (
                junction_read("a", Some("5,700,+,40M10S,50,0"), ("1", 400)),
                SupportType::Junction,
            ),
            (junction_read("b", None, ("5", 20000)), SupportType::Junction),
            (junction_read("c", None, ("5", 20000)), SupportType::Junction),
            (junction_read("a", None, ("1", 101)), SupportType::JunctionMate),
        ];
        let assembly = JunctionAssembly::from_reads(Junction::forward("1", 110), &reads, 26).unwrap();
        let regions = collect_remote_regions(&assembly, &AssemblyConfig::default());

        // read a: local mate, supplementary on 5; b and c: mates on 5
        assert_eq!(regions.len(), 2);
        let supp = regions.iter().find(|r| r.is_supp_only()).unwrap();
        assert_eq!((supp.start(), supp.end()), (700, 739));
        assert_eq!(supp.soft_clip_map_qual_total(), 50 * 40);
        let mates = regions.iter().find(|r| !r.is_supp_only()).unwrap();
        assert_eq!(mates.mate_count(), 2);
        assert_eq!(mates.orientation(), Orientation::Reverse);
        assert_eq!(mates.end(), 20049);
    }
}
