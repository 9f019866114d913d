// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use bio_types::genome::AbstractLocus;

use crate::errors::Error;
use crate::utils::genomics::compare_chromosomes;

pub mod group;
pub mod loader;

pub use group::{assign_candidate_reads, build_junction_groups, JunctionGroup};
pub use loader::{load_junctions, merge_junctions};

/// Side of a breakpoint on which the reference sequence continues.
///
/// A forward junction keeps the reference at and below its position, novel sequence
/// continues upward. A reverse junction is the mirror image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr,
)]
pub enum Orientation {
    #[strum(serialize = "+")]
    Forward,
    #[strum(serialize = "-")]
    Reverse,
}

impl Orientation {
    pub fn sign(self) -> i8 {
        match self {
            Orientation::Forward => 1,
            Orientation::Reverse => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }

    pub fn is_forward(self) -> bool {
        self == Orientation::Forward
    }

    pub fn is_reverse(self) -> bool {
        self == Orientation::Reverse
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "+" | "1" => Ok(Orientation::Forward),
            "-" | "-1" => Ok(Orientation::Reverse),
            _ => Err(Error::InvalidOrientation {
                value: value.to_owned(),
            }),
        }
    }
}

/// A candidate breakpoint. Equality, hashing and ordering only consider the locus and
/// orientation, never `indel_based`.
#[derive(Debug, Clone, new, Getters, CopyGetters)]
pub struct Junction {
    #[getset(get = "pub")]
    chromosome: String,
    #[getset(get_copy = "pub")]
    position: i32,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    /// Derived from a CIGAR insertion or deletion rather than a soft clip.
    #[new(default)]
    #[getset(get_copy = "pub")]
    indel_based: bool,
}

impl Junction {
    pub fn forward(chromosome: &str, position: i32) -> Self {
        Junction::new(chromosome.to_owned(), position, Orientation::Forward)
    }

    pub fn reverse(chromosome: &str, position: i32) -> Self {
        Junction::new(chromosome.to_owned(), position, Orientation::Reverse)
    }

    pub fn with_indel_based(mut self, indel_based: bool) -> Self {
        self.indel_based = indel_based;
        self
    }

    pub fn is_forward(&self) -> bool {
        self.orientation.is_forward()
    }

    pub fn is_reverse(&self) -> bool {
        self.orientation.is_reverse()
    }

    /// Same position and orientation, chromosome not considered.
    pub fn local_match(&self, other: &Junction) -> bool {
        self.position == other.position && self.orientation == other.orientation
    }

    pub fn coords(&self) -> String {
        format!("{}:{}:{}", self.chromosome, self.position, self.orientation)
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.coords())?;
        if self.indel_based {
            write!(f, " indel")?;
        }
        Ok(())
    }
}

impl PartialEq for Junction {
    fn eq(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome
            && self.position == other.position
            && self.orientation == other.orientation
    }
}

impl Eq for Junction {}

impl Hash for Junction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chromosome.hash(state);
        self.position.hash(state);
        self.orientation.hash(state);
    }
}

impl Ord for Junction {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_chromosomes(&self.chromosome, &other.chromosome)
            .then_with(|| self.position.cmp(&other.position))
            .then_with(|| self.orientation.cmp(&other.orientation))
    }
}

impl PartialOrd for Junction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AbstractLocus for Junction {
    fn contig(&self) -> &str {
        &self.chromosome
    }

    fn pos(&self) -> u64 {
        self.position.max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_parsing() {
        assert_eq!("+".parse::<Orientation>().unwrap(), Orientation::Forward);
        assert_eq!("-1".parse::<Orientation>().unwrap(), Orientation::Reverse);
        assert_eq!(
            "x".parse::<Orientation>(),
            Err(Error::InvalidOrientation {
                value: "x".to_owned()
            })
        );
        assert_eq!(Orientation::Forward.to_string(), "+");
        assert_eq!(Orientation::Reverse.sign(), -1);
        assert_eq!(Orientation::Reverse.opposite(), Orientation::Forward);
    }

    #[test]
    fn test_junction_ordering() {
        let mut junctions = vec![
            Junction::reverse("2", 100),
            Junction::forward("10", 50),
            Junction::forward("2", 100),
            Junction::reverse("1", 500),
            Junction::forward("2", 99),
        ];
        junctions.sort();
        let coords: Vec<_> = junctions.iter().map(|j| j.coords()).collect();
        assert_eq!(
            coords,
            vec!["1:500:-", "2:99:+", "2:100:+", "2:100:-", "10:50:+"]
        );
    }

    #[test]
    fn test_indel_flag_does_not_distinguish_junctions() {
        let clipped = Junction::forward("1", 100);
        let indel = Junction::forward("1", 100).with_indel_based(true);
        assert_eq!(clipped, indel);
        assert_eq!(clipped.cmp(&indel), Ordering::Equal);
        assert!(Junction::forward("1", 99).with_indel_based(true) < clipped);
    }

    #[test]
    fn test_local_match() {
        let a = Junction::forward("1", 100);
        assert!(a.local_match(&Junction::forward("2", 100)));
        assert!(!a.local_match(&Junction::reverse("1", 100)));
        assert!(!a.local_match(&Junction::forward("1", 101)));
    }

    #[test]
    fn test_locus() {
        let junction = Junction::forward("chr3", 12345).with_indel_based(true);
        assert_eq!(junction.contig(), "chr3");
        assert_eq!(junction.pos(), 12345);
        assert_eq!(junction.to_string(), "chr3:12345:+ indel");
    }
}
