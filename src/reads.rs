// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory aligned reads.
//!
//! Reads are parsed once (e.g. from a BAM record) and afterwards shared as `Arc<Read>`
//! between all assemblies they support. Positions are 1-based and inclusive.

use std::convert::TryFrom;
use std::str;

use anyhow::Result;
use rust_htslib::bam;
use rust_htslib::bam::record::{Aux, Cigar, CigarString};

use crate::errors::Error;
use crate::junction::{Junction, Orientation};

/// First entry of a SA tag.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters)]
pub struct SupplementaryAlignment {
    #[getset(get = "pub")]
    chromosome: String,
    #[getset(get_copy = "pub")]
    position: i32,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    #[getset(get = "pub")]
    cigar: String,
    #[getset(get_copy = "pub")]
    mapping_quality: u8,
}

impl SupplementaryAlignment {
    /// Parse the first alignment of a SA tag value (`chr,pos,strand,CIGAR,mapQ,NM;...`).
    pub fn parse(read_id: &str, value: &str) -> Result<Self> {
        let invalid = || Error::InvalidSupplementaryTag {
            read: read_id.to_owned(),
            value: value.to_owned(),
        };
        let first = value.split(';').next().ok_or_else(invalid)?;
        let fields: Vec<&str> = first.split(',').collect();
        if fields.len() < 5 {
            return Err(invalid().into());
        }
        let position = fields[1].parse::<i32>().map_err(|_| invalid())?;
        let orientation = match fields[2] {
            "+" => Orientation::Forward,
            "-" => Orientation::Reverse,
            _ => return Err(invalid().into()),
        };
        let mapping_quality = fields[4].parse::<u8>().map_err(|_| invalid())?;

        Ok(SupplementaryAlignment::new(
            fields[0].to_owned(),
            position,
            orientation,
            fields[3].to_owned(),
            mapping_quality,
        ))
    }

    /// Last reference position covered by the supplementary alignment.
    pub fn alignment_end(&self) -> i32 {
        match CigarString::try_from(self.cigar.as_str()) {
            Ok(cigar) => self.position + reference_length(&cigar) as i32 - 1,
            Err(_) => self.position,
        }
    }
}

#[derive(Debug, Clone, Builder, Getters, CopyGetters)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Read {
    #[builder(setter(into))]
    #[getset(get = "pub")]
    id: String,
    #[builder(setter(into))]
    #[getset(get = "pub")]
    chromosome: String,
    #[builder(setter(into))]
    #[getset(get = "pub")]
    bases: Vec<u8>,
    #[builder(setter(into))]
    #[getset(get = "pub")]
    base_quals: Vec<u8>,
    #[getset(get_copy = "pub")]
    alignment_start: i32,
    #[getset(get = "pub")]
    cigar: CigarString,
    #[builder(default = "60")]
    #[getset(get_copy = "pub")]
    mapping_quality: u8,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    is_paired: bool,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    is_reverse_strand: bool,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    is_first_in_pair: bool,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    is_supplementary: bool,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    is_mate_unmapped: bool,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    is_mate_reverse_strand: bool,
    #[builder(default, setter(into, strip_option))]
    #[getset(get = "pub")]
    mate_chromosome: Option<String>,
    #[builder(default, setter(strip_option))]
    #[getset(get_copy = "pub")]
    mate_alignment_start: Option<i32>,
    #[builder(default, setter(strip_option))]
    #[getset(get = "pub")]
    mate_cigar: Option<CigarString>,
    #[builder(default, setter(strip_option))]
    #[getset(get = "pub")]
    supplementary_alignment: Option<SupplementaryAlignment>,
    #[builder(default, setter(strip_option))]
    edit_distance: Option<u32>,
}

impl ReadBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(bases), Some(quals)) = (&self.bases, &self.base_quals) {
            if bases.len() != quals.len() {
                return Err(format!(
                    "{} bases but {} base qualities",
                    bases.len(),
                    quals.len()
                ));
            }
        }
        if let (Some(bases), Some(cigar)) = (&self.bases, &self.cigar) {
            let covered = query_length(cigar) as usize;
            if bases.len() != covered {
                return Err(format!(
                    "{} bases but CIGAR {} covers {} read bases",
                    bases.len(),
                    cigar,
                    covered
                ));
            }
        }
        Ok(())
    }
}

impl Read {
    /// Convert a mapped BAM record. Mate coordinates are only kept for mapped mates.
    pub fn from_bam_record(record: &bam::Record, header: &bam::HeaderView) -> Result<Self> {
        let id = str::from_utf8(record.qname())?.to_owned();
        if record.is_unmapped() || record.tid() < 0 {
            return Err(Error::UnmappedRead { read: id }.into());
        }
        let chromosome = str::from_utf8(header.tid2name(record.tid() as u32))?.to_owned();
        let bases = record.seq().as_bytes();
        let base_quals = record.qual().to_vec();
        if bases.len() != base_quals.len() {
            return Err(Error::InconsistentReadLength {
                read: id,
                bases: bases.len(),
                quals: base_quals.len(),
            }
            .into());
        }
        let cigar = record.cigar().take();
        if query_length(&cigar) as usize != bases.len() {
            return Err(Error::CigarLengthMismatch {
                read: id,
                bases: bases.len(),
                cigar_length: query_length(&cigar) as usize,
            }
            .into());
        }

        let has_mate = record.is_paired() && !record.is_mate_unmapped() && record.mtid() >= 0;
        let mate_chromosome = if has_mate {
            Some(str::from_utf8(header.tid2name(record.mtid() as u32))?.to_owned())
        } else {
            None
        };
        let mate_cigar = match record.aux(b"MC") {
            Ok(Aux::String(mc)) if has_mate => CigarString::try_from(mc).ok(),
            _ => None,
        };
        let supplementary_alignment = match record.aux(b"SA") {
            Ok(Aux::String(sa)) => Some(SupplementaryAlignment::parse(&id, sa)?),
            _ => None,
        };
        let edit_distance = match record.aux(b"NM") {
            Ok(Aux::U8(nm)) => Some(nm as u32),
            Ok(Aux::U16(nm)) => Some(nm as u32),
            Ok(Aux::U32(nm)) => Some(nm),
            Ok(Aux::I8(nm)) => Some(nm.max(0) as u32),
            Ok(Aux::I16(nm)) => Some(nm.max(0) as u32),
            Ok(Aux::I32(nm)) => Some(nm.max(0) as u32),
            _ => None,
        };

        Ok(Read {
            id,
            chromosome,
            bases,
            base_quals,
            alignment_start: record.pos() as i32 + 1,
            cigar,
            mapping_quality: record.mapq(),
            is_paired: record.is_paired(),
            is_reverse_strand: record.is_reverse(),
            is_first_in_pair: record.is_first_in_template(),
            is_supplementary: record.is_supplementary(),
            is_mate_unmapped: record.is_mate_unmapped(),
            is_mate_reverse_strand: record.is_mate_reverse(),
            mate_chromosome,
            mate_alignment_start: if has_mate {
                Some(record.mpos() as i32 + 1)
            } else {
                None
            },
            mate_cigar,
            supplementary_alignment,
            edit_distance,
        })
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn alignment_end(&self) -> i32 {
        self.alignment_start + reference_length(&self.cigar) as i32 - 1
    }

    pub fn left_clip_length(&self) -> usize {
        self.cigar
            .iter()
            .find(|op| !matches!(op, Cigar::HardClip(_)))
            .map_or(0, |op| match op {
                Cigar::SoftClip(l) => *l as usize,
                _ => 0,
            })
    }

    pub fn right_clip_length(&self) -> usize {
        self.cigar
            .iter()
            .rev()
            .find(|op| !matches!(op, Cigar::HardClip(_)))
            .map_or(0, |op| match op {
                Cigar::SoftClip(l) => *l as usize,
                _ => 0,
            })
    }

    pub fn unclipped_start(&self) -> i32 {
        self.alignment_start - self.left_clip_length() as i32
    }

    pub fn unclipped_end(&self) -> i32 {
        self.alignment_end() + self.right_clip_length() as i32
    }

    /// Soft clip on the side where a junction of the given orientation has its novel sequence.
    pub fn clip_length_towards(&self, orientation: Orientation) -> usize {
        match orientation {
            Orientation::Forward => self.right_clip_length(),
            Orientation::Reverse => self.left_clip_length(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        if self.is_reverse_strand {
            Orientation::Reverse
        } else {
            Orientation::Forward
        }
    }

    /// Edit distance from the NM tag, falling back to the indel bases of the CIGAR.
    pub fn number_of_events(&self) -> u32 {
        self.edit_distance.unwrap_or_else(|| {
            self.cigar
                .iter()
                .map(|op| match op {
                    Cigar::Ins(l) | Cigar::Del(l) => *l,
                    _ => 0,
                })
                .sum()
        })
    }

    /// Index into `bases` of the base aligned to `position`.
    ///
    /// Positions within soft clips are extrapolated from the alignment. A deleted position
    /// resolves to the base before the deletion if `prefer_start` is set, else to the base after.
    pub fn read_index_at_reference_position(
        &self,
        position: i32,
        prefer_start: bool,
    ) -> Option<usize> {
        if self.bases.is_empty()
            || position < self.unclipped_start()
            || position > self.unclipped_end()
        {
            return None;
        }
        if position < self.alignment_start {
            return Some(self.left_clip_length() - (self.alignment_start - position) as usize);
        }
        let alignment_end = self.alignment_end();
        if position > alignment_end {
            return Some(self.len() - 1 - (self.unclipped_end() - position) as usize);
        }

        let mut ref_pos = self.alignment_start;
        let mut read_index = 0usize;
        for op in self.cigar.iter() {
            match *op {
                Cigar::SoftClip(l) | Cigar::Ins(l) => read_index += l as usize,
                Cigar::Match(l) | Cigar::Equal(l) | Cigar::Diff(l) => {
                    if position < ref_pos + l as i32 {
                        return Some(read_index + (position - ref_pos) as usize);
                    }
                    ref_pos += l as i32;
                    read_index += l as usize;
                }
                Cigar::Del(l) | Cigar::RefSkip(l) => {
                    if position < ref_pos + l as i32 {
                        return if prefer_start {
                            read_index.checked_sub(1)
                        } else if read_index < self.len() {
                            Some(read_index)
                        } else {
                            None
                        };
                    }
                    ref_pos += l as i32;
                }
                Cigar::HardClip(_) | Cigar::Pad(_) => (),
            }
        }

        None
    }

    /// Whether a CIGAR insertion or deletion of at least `min_length` abuts the junction on its
    /// novel side.
    pub fn indel_at_junction(&self, junction: &Junction, min_length: u32) -> bool {
        if self.chromosome != *junction.chromosome() {
            return false;
        }
        let mut ref_pos = self.alignment_start;
        for op in self.cigar.iter() {
            match *op {
                Cigar::Del(l) | Cigar::Ins(l) if l >= min_length => {
                    let is_del = matches!(op, Cigar::Del(_));
                    let abuts = match junction.orientation() {
                        Orientation::Forward => ref_pos - 1 == junction.position(),
                        Orientation::Reverse if is_del => {
                            ref_pos + l as i32 == junction.position()
                        }
                        Orientation::Reverse => ref_pos == junction.position(),
                    };
                    if abuts {
                        return true;
                    }
                    if is_del {
                        ref_pos += l as i32;
                    }
                }
                Cigar::Match(l)
                | Cigar::Equal(l)
                | Cigar::Diff(l)
                | Cigar::Del(l)
                | Cigar::RefSkip(l) => ref_pos += l as i32,
                _ => (),
            }
        }
        false
    }

    /// Last reference position of the mate, estimated from the read length without a mate CIGAR.
    pub fn mate_alignment_end(&self) -> Option<i32> {
        let start = self.mate_alignment_start?;
        Some(match &self.mate_cigar {
            Some(cigar) => start + reference_length(cigar) as i32 - 1,
            None => start + self.len() as i32 - 1,
        })
    }

    pub fn has_mapped_mate(&self) -> bool {
        self.is_paired && !self.is_mate_unmapped && self.mate_alignment_start.is_some()
    }

    /// Mate on another chromosome, too far away, or on the same strand.
    pub fn is_discordant(&self, max_fragment_length: i32) -> bool {
        if !self.has_mapped_mate() {
            return false;
        }
        match &self.mate_chromosome {
            Some(mate_chromosome) if *mate_chromosome != self.chromosome => true,
            Some(_) => {
                let mate_start = self.mate_alignment_start.unwrap_or(self.alignment_start);
                (mate_start - self.alignment_start).abs() > max_fragment_length
                    || self.is_reverse_strand == self.is_mate_reverse_strand
            }
            None => false,
        }
    }

    /// Same sequenced fragment, i.e. this read, its mate or one of their supplementaries.
    pub fn matches_fragment(&self, other: &Read) -> bool {
        self.id == other.id
    }
}

pub(crate) fn reference_length(cigar: &CigarString) -> u32 {
    cigar
        .iter()
        .map(|op| match op {
            Cigar::Match(l) | Cigar::Equal(l) | Cigar::Diff(l) | Cigar::Del(l) | Cigar::RefSkip(l) => {
                *l
            }
            _ => 0,
        })
        .sum()
}

/// Number of read bases consumed by the CIGAR.
pub(crate) fn query_length(cigar: &CigarString) -> u32 {
    cigar
        .iter()
        .map(|op| match op {
            Cigar::Match(l)
            | Cigar::Equal(l)
            | Cigar::Diff(l)
            | Cigar::Ins(l)
            | Cigar::SoftClip(l) => *l,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(cigar: Vec<Cigar>, start: i32) -> Read {
        let len = query_length(&CigarString(cigar.clone()));
        ReadBuilder::default()
            .id("r1")
            .chromosome("1")
            .bases(vec![b'A'; len as usize])
            .base_quals(vec![30; len as usize])
            .alignment_start(start)
            .cigar(CigarString(cigar))
            .build()
            .unwrap()
    }

    #[test]
    fn test_clips_and_bounds() {
        let r = read(vec![Cigar::SoftClip(5), Cigar::Match(20), Cigar::SoftClip(10)], 100);
        assert_eq!(r.len(), 35);
        assert_eq!(r.alignment_end(), 119);
        assert_eq!(r.left_clip_length(), 5);
        assert_eq!(r.right_clip_length(), 10);
        assert_eq!(r.unclipped_start(), 95);
        assert_eq!(r.unclipped_end(), 129);
        assert_eq!(r.clip_length_towards(Orientation::Forward), 10);
        assert_eq!(r.clip_length_towards(Orientation::Reverse), 5);
    }

    #[test]
    fn test_read_index_at_reference_position() {
        let r = read(
            vec![
                Cigar::SoftClip(5),
                Cigar::Match(10),
                Cigar::Del(3),
                Cigar::Match(5),
                Cigar::Ins(2),
                Cigar::Match(5),
                Cigar::SoftClip(4),
            ],
            100,
        );
        assert_eq!(r.read_index_at_reference_position(95, true), Some(0));
        assert_eq!(r.read_index_at_reference_position(100, true), Some(5));
        assert_eq!(r.read_index_at_reference_position(109, true), Some(14));
        // deleted positions 110-112
        assert_eq!(r.read_index_at_reference_position(111, true), Some(14));
        assert_eq!(r.read_index_at_reference_position(111, false), Some(15));
        assert_eq!(r.read_index_at_reference_position(113, true), Some(15));
        // after the insertion
        assert_eq!(r.read_index_at_reference_position(118, true), Some(22));
        assert_eq!(r.alignment_end(), 122);
        assert_eq!(r.read_index_at_reference_position(122, true), Some(26));
        assert_eq!(r.read_index_at_reference_position(126, true), Some(30));
        assert_eq!(r.read_index_at_reference_position(127, true), None);
        assert_eq!(r.read_index_at_reference_position(94, true), None);
        assert_eq!(r.number_of_events(), 5);
    }

    #[test]
    fn test_indel_at_junction() {
        let r = read(vec![Cigar::Match(20), Cigar::Del(10), Cigar::Match(20)], 100);
        assert!(r.indel_at_junction(&Junction::forward("1", 119), 3));
        assert!(r.indel_at_junction(&Junction::reverse("1", 130), 3));
        assert!(!r.indel_at_junction(&Junction::forward("1", 119), 11));
        assert!(!r.indel_at_junction(&Junction::forward("1", 120), 3));

        let r = read(vec![Cigar::Match(20), Cigar::Ins(8), Cigar::Match(20)], 100);
        assert!(r.indel_at_junction(&Junction::forward("1", 119), 3));
        assert!(r.indel_at_junction(&Junction::reverse("1", 120), 3));
    }

    #[test]
    fn test_supplementary_parse() {
        let sa = SupplementaryAlignment::parse("r1", "2,5000,-,30M20S,45,0;3,10,+,20M,10,1;").unwrap();
        assert_eq!(sa.chromosome(), "2");
        assert_eq!(sa.position(), 5000);
        assert_eq!(sa.orientation(), Orientation::Reverse);
        assert_eq!(sa.mapping_quality(), 45);
        assert_eq!(sa.alignment_end(), 5029);
        assert!(SupplementaryAlignment::parse("r1", "2,abc,-,30M,45,0").is_err());
    }

    #[test]
    fn test_discordant() {
        let base = |mate_chrom: &str, mate_start: i32, mate_reverse: bool| {
            ReadBuilder::default()
                .id("r1")
                .chromosome("1")
                .bases(vec![b'A'; 10])
                .base_quals(vec![30; 10])
                .alignment_start(1000)
                .cigar(CigarString(vec![Cigar::Match(10)]))
                .is_paired(true)
                .is_mate_reverse_strand(mate_reverse)
                .mate_chromosome(mate_chrom)
                .mate_alignment_start(mate_start)
                .build()
                .unwrap()
        };
        assert!(!base("1", 1300, true).is_discordant(1000));
        assert!(base("1", 5000, true).is_discordant(1000));
        assert!(base("2", 1300, true).is_discordant(1000));
        assert!(base("1", 1300, false).is_discordant(1000));
        assert_eq!(base("1", 1300, true).mate_alignment_end(), Some(1309));
    }

    #[test]
    fn test_builder_validation() {
        let result = ReadBuilder::default()
            .id("r1")
            .chromosome("1")
            .bases(vec![b'A'; 10])
            .base_quals(vec![30; 9])
            .alignment_start(1)
            .cigar(CigarString(vec![Cigar::Match(10)]))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_cigar_length_mismatch() {
        // 10S5M consumes 15 read bases
        let result = ReadBuilder::default()
            .id("r1")
            .chromosome("1")
            .bases(vec![b'A'; 9])
            .base_quals(vec![30; 9])
            .alignment_start(200)
            .cigar(CigarString(vec![Cigar::SoftClip(10), Cigar::Match(5)]))
            .build();
        assert!(result.is_err());

        let cigar = CigarString(vec![
            Cigar::HardClip(3),
            Cigar::SoftClip(2),
            Cigar::Match(5),
            Cigar::Del(4),
            Cigar::Ins(1),
            Cigar::Equal(2),
        ]);
        assert_eq!(query_length(&cigar), 10);
        assert!(ReadBuilder::default()
            .id("r1")
            .chromosome("1")
            .bases(vec![b'A'; 10])
            .base_quals(vec![30; 10])
            .alignment_start(200)
            .cigar(cigar)
            .build()
            .is_ok());
    }
}
