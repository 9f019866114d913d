// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Pairwise links between assemblies.
//!
//! A split link joins two assemblies whose novel sequences describe the same breakpoint from
//! either side: the novel bases of the first contain the reference bases of the second. A
//! facing link joins two nearby assemblies whose junctions point at each other.

use crate::assembly::{AssemblySequence, JunctionAssembly};
use crate::config::AssemblyConfig;
use crate::junction::{Junction, Orientation};
use crate::utils::genomics::position_distance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum LinkType {
    #[strum(serialize = "SPLIT")]
    Split,
    #[strum(serialize = "FACING")]
    Facing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum SvType {
    #[strum(serialize = "BND")]
    Bnd,
    #[strum(serialize = "DEL")]
    Del,
    #[strum(serialize = "DUP")]
    Dup,
    #[strum(serialize = "INS")]
    Ins,
    #[strum(serialize = "INV")]
    Inv,
}

impl SvType {
    /// Classify the rearrangement joining two junctions.
    pub fn classify(first: &Junction, second: &Junction, inserted_bases: &str) -> SvType {
        if first.chromosome() != second.chromosome() {
            return SvType::Bnd;
        }
        if first.orientation() == second.orientation() {
            return SvType::Inv;
        }
        let (lower, upper) = if first.position() <= second.position() {
            (first, second)
        } else {
            (second, first)
        };
        if upper.position() - lower.position() == 1 && !inserted_bases.is_empty() {
            SvType::Ins
        } else if lower.is_forward() {
            SvType::Dup
        } else {
            SvType::Del
        }
    }
}

/// Two assemblies, referenced by their index in the assembly arena, and how they connect.
#[derive(Debug, Clone, PartialEq, new, Getters, CopyGetters)]
pub struct AssemblyLink {
    #[getset(get_copy = "pub")]
    first: usize,
    #[getset(get_copy = "pub")]
    second: usize,
    #[getset(get = "pub")]
    first_junction: Junction,
    #[getset(get = "pub")]
    second_junction: Junction,
    #[getset(get_copy = "pub")]
    link_type: LinkType,
    /// Index in the second assembly's bases of the first assembly's junction base.
    /// Absent for facing links; may fall outside the bases for long insertions.
    #[getset(get_copy = "pub")]
    first_junction_index_in_second: Option<i32>,
    #[getset(get = "pub")]
    inserted_bases: String,
    /// Number of bases shared by the two sequences.
    #[getset(get_copy = "pub")]
    overlap_bases: usize,
}

impl AssemblyLink {
    pub fn sv_type(&self) -> SvType {
        SvType::classify(
            &self.first_junction,
            &self.second_junction,
            &self.inserted_bases,
        )
    }

    pub fn length(&self) -> i32 {
        match self.link_type {
            LinkType::Facing => {
                (self.second_junction.position() - self.first_junction.position()).abs()
            }
            LinkType::Split => position_distance(
                self.first_junction.chromosome(),
                self.first_junction.position(),
                self.second_junction.chromosome(),
                self.second_junction.position(),
            )
            .unwrap_or(0),
        }
    }

    pub fn has_assembly(&self, index: usize) -> bool {
        self.first == index || self.second == index
    }

    pub fn other_assembly(&self, index: usize) -> Option<usize> {
        if self.first == index {
            Some(self.second)
        } else if self.second == index {
            Some(self.first)
        } else {
            None
        }
    }

    /// Same assembly pair, in either order, and same link type.
    pub fn matches(&self, other: &AssemblyLink) -> bool {
        self.link_type == other.link_type
            && self.has_assembly(other.first)
            && self.has_assembly(other.second)
    }
}

struct SplitOverlap {
    inserted_bases: Vec<u8>,
    first_junction_index_in_second: i32,
    overlap_bases: usize,
}

/// Look for the second assembly's reference bases, starting at its junction, within the
/// novel bases of the first. Both sequences are strand normalised first.
fn find_split_overlap(
    first: &JunctionAssembly,
    second: &JunctionAssembly,
    config: &AssemblyConfig,
) -> Option<SplitOverlap> {
    let oriented_first = AssemblySequence::from(first).oriented();
    let novel = oriented_first.novel_bases();

    // reference bases of the second read away from its junction, in the first's frame
    let second_flipped = AssemblySequence::from(second).oriented().reverse_complement();
    let second_junction_index = second_flipped.junction_index()?;
    let second_bases = second_flipped.bases();

    let seed_length = config.link_overlap_bases;
    if seed_length == 0
        || novel.len() < seed_length
        || second_junction_index + seed_length > second_bases.len()
    {
        return None;
    }
    let seed = &second_bases[second_junction_index..second_junction_index + seed_length];
    if seed.contains(&0) {
        return None;
    }
    let second_rest = &second_bases[second_junction_index + seed_length..];

    for offset in 0..=novel.len() - seed_length {
        if &novel[offset..offset + seed_length] != seed {
            continue;
        }
        let first_rest = &novel[offset + seed_length..];
        let mismatches = first_rest
            .iter()
            .zip(second_rest.iter())
            .filter(|(a, b)| **a != 0 && **b != 0 && a != b)
            .count();
        if mismatches > config.link_permitted_mismatches {
            continue;
        }

        let flipped_index = second_junction_index as i32 - offset as i32 - 1;
        let first_junction_index_in_second = match second.junction().orientation() {
            Orientation::Reverse => flipped_index,
            Orientation::Forward => second_bases.len() as i32 - 1 - flipped_index,
        };
        return Some(SplitOverlap {
            inserted_bases: novel[..offset].to_vec(),
            first_junction_index_in_second,
            overlap_bases: seed_length + first_rest.len().min(second_rest.len()),
        });
    }
    None
}

/// Try to join two assemblies by overlapping sequence, in both directions.
pub fn try_split_link(
    assemblies: &[JunctionAssembly],
    first: usize,
    second: usize,
    config: &AssemblyConfig,
) -> Option<AssemblyLink> {
    if first == second {
        return None;
    }
    let candidates = [(first, second), (second, first)];
    candidates.iter().find_map(|&(a, b)| {
        find_split_overlap(&assemblies[a], &assemblies[b], config).map(|overlap| {
            AssemblyLink::new(
                a,
                b,
                assemblies[a].junction().clone(),
                assemblies[b].junction().clone(),
                LinkType::Split,
                Some(overlap.first_junction_index_in_second),
                String::from_utf8_lossy(&overlap.inserted_bases).into_owned(),
                overlap.overlap_bases,
            )
        })
    })
}

/// Try to join two nearby assemblies whose junctions face each other: the lower one reverse,
/// the upper one forward. The lower assembly becomes the first of the link.
pub fn try_facing_link(
    assemblies: &[JunctionAssembly],
    first: usize,
    second: usize,
    config: &AssemblyConfig,
) -> Option<AssemblyLink> {
    let (lower, upper) = if assemblies[first].junction().position()
        <= assemblies[second].junction().position()
    {
        (first, second)
    } else {
        (second, first)
    };
    let lower_junction = assemblies[lower].junction();
    let upper_junction = assemblies[upper].junction();
    if first == second
        || lower_junction.chromosome() != upper_junction.chromosome()
        || !lower_junction.is_reverse()
        || !upper_junction.is_forward()
    {
        return None;
    }
    let distance = upper_junction.position() - lower_junction.position();
    if distance <= 0 || distance > config.facing_link_max_distance {
        return None;
    }

    Some(AssemblyLink::new(
        lower,
        upper,
        lower_junction.clone(),
        upper_junction.clone(),
        LinkType::Facing,
        None,
        String::new(),
        0,
    ))
}
