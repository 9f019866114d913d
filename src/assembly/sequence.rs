// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::borrow::Cow;

use bio::alphabets::dna;

use crate::assembly::JunctionAssembly;
use crate::junction::{Junction, Orientation};
use crate::utils::repeats::{find_repeats, RepeatInfo};

/// The kinds of sequence taking part in linking.
#[derive(Debug, Clone)]
pub enum AssemblySequence<'a> {
    /// A consensus assembled at a junction.
    Junction(&'a JunctionAssembly),
    /// Reference bases ending at a junction, e.g. the undisrupted side of a breakpoint.
    RefBases {
        junction: Junction,
        bases: Vec<u8>,
        base_quals: Vec<u8>,
    },
    /// Bases without a junction anchor.
    Raw { bases: Vec<u8>, base_quals: Vec<u8> },
}

/// A copy of a sequence arranged with its reference bases on the left.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct OrientedSequence {
    #[getset(get = "pub")]
    bases: Vec<u8>,
    #[getset(get = "pub")]
    base_quals: Vec<u8>,
    #[getset(get_copy = "pub")]
    junction_index: Option<usize>,
    /// Whether the bases were reverse complemented.
    #[getset(get_copy = "pub")]
    reversed: bool,
    #[getset(get_copy = "pub")]
    reference_on_left: bool,
}

impl OrientedSequence {
    pub fn reverse_complement(&self) -> OrientedSequence {
        let mut base_quals = self.base_quals.clone();
        base_quals.reverse();
        OrientedSequence {
            bases: dna::revcomp(&self.bases),
            base_quals,
            junction_index: self
                .junction_index
                .map(|index| self.bases.len() - 1 - index),
            reversed: !self.reversed,
            reference_on_left: !self.reference_on_left,
        }
    }

    /// Bases beyond the junction, empty without a junction.
    pub fn novel_bases(&self) -> &[u8] {
        match self.junction_index {
            Some(index) if self.reference_on_left => &self.bases[index + 1..],
            Some(index) => &self.bases[..index],
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

impl<'a> AssemblySequence<'a> {
    pub fn bases(&self) -> &[u8] {
        match self {
            AssemblySequence::Junction(assembly) => assembly.bases(),
            AssemblySequence::RefBases { bases, .. } | AssemblySequence::Raw { bases, .. } => {
                bases
            }
        }
    }

    pub fn base_quals(&self) -> &[u8] {
        match self {
            AssemblySequence::Junction(assembly) => assembly.base_quals(),
            AssemblySequence::RefBases { base_quals, .. }
            | AssemblySequence::Raw { base_quals, .. } => base_quals,
        }
    }

    pub fn junction(&self) -> Option<&Junction> {
        match self {
            AssemblySequence::Junction(assembly) => Some(assembly.junction()),
            AssemblySequence::RefBases { junction, .. } => Some(junction),
            AssemblySequence::Raw { .. } => None,
        }
    }

    /// Index of the junction base. Reference bases sit below a forward junction and above a
    /// reverse one.
    pub fn junction_index(&self) -> Option<usize> {
        match self {
            AssemblySequence::Junction(assembly) => Some(assembly.junction_index()),
            AssemblySequence::RefBases {
                junction, bases, ..
            } => match junction.orientation() {
                _ if bases.is_empty() => None,
                Orientation::Forward => Some(bases.len() - 1),
                Orientation::Reverse => Some(0),
            },
            AssemblySequence::Raw { .. } => None,
        }
    }

    pub fn repeats(&self) -> Cow<[RepeatInfo]> {
        match self {
            AssemblySequence::Junction(assembly) => Cow::Borrowed(assembly.repeat_info()),
            _ => Cow::Owned(find_repeats(self.bases())),
        }
    }

    /// Copy with the reference side on the left: reverse junctions are reverse complemented.
    pub fn oriented(&self) -> OrientedSequence {
        let oriented = OrientedSequence {
            bases: self.bases().to_vec(),
            base_quals: self.base_quals().to_vec(),
            junction_index: self.junction_index(),
            reversed: false,
            reference_on_left: true,
        };
        match self.junction().map(|junction| junction.orientation()) {
            Some(Orientation::Reverse) => oriented.reverse_complement(),
            _ => oriented,
        }
    }

    /// Reference-side and novel-side segments in reference order. The junction base belongs
    /// to the reference side. Unanchored sequences are all reference.
    pub fn decompose(&self) -> (&[u8], &[u8]) {
        let bases = self.bases();
        match (self.junction(), self.junction_index()) {
            (Some(junction), Some(index)) => match junction.orientation() {
                Orientation::Forward => (&bases[..=index], &bases[index + 1..]),
                Orientation::Reverse => (&bases[index..], &bases[..index]),
            },
            _ => (bases, &bases[..0]),
        }
    }
}

impl<'a> From<&'a JunctionAssembly> for AssemblySequence<'a> {
    fn from(assembly: &'a JunctionAssembly) -> Self {
        AssemblySequence::Junction(assembly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ref_bases(junction: Junction, bases: &[u8]) -> AssemblySequence<'static> {
        AssemblySequence::RefBases {
            junction,
            base_quals: vec![30; bases.len()],
            bases: bases.to_vec(),
        }
    }

    #[test]
    fn test_ref_bases_decompose() {
        let forward = ref_bases(Junction::forward("1", 100), b"ACGTT");
        assert_eq!(forward.junction_index(), Some(4));
        assert_eq!(forward.decompose(), (&b"ACGTT"[..], &b""[..]));

        let reverse = ref_bases(Junction::reverse("1", 100), b"ACGTT");
        assert_eq!(reverse.junction_index(), Some(0));
        let oriented = reverse.oriented();
        assert!(oriented.reversed());
        assert_eq!(oriented.bases(), b"AACGT");
        assert_eq!(oriented.junction_index(), Some(4));
    }

    #[test]
    fn test_raw_sequence() {
        let raw = AssemblySequence::Raw {
            bases: b"AAAACG".to_vec(),
            base_quals: vec![30; 6],
        };
        assert_eq!(raw.junction_index(), None);
        assert_eq!(raw.decompose(), (&b"AAAACG"[..], &b""[..]));
        assert_eq!(raw.repeats().len(), 1);
        let oriented = raw.oriented();
        assert!(!oriented.reversed());
        assert!(oriented.novel_bases().is_empty());
    }

    #[test]
    fn test_oriented_reverse_complement() {
        let sequence = OrientedSequence {
            bases: b"AACGT".to_vec(),
            base_quals: vec![10, 20, 30, 40, 50],
            junction_index: Some(1),
            reversed: false,
            reference_on_left: true,
        };
        assert_eq!(sequence.novel_bases(), b"CGT");
        let rc = sequence.reverse_complement();
        assert_eq!(rc.bases(), b"ACGTT");
        assert_eq!(rc.base_quals(), &[50, 40, 30, 20, 10]);
        assert_eq!(rc.junction_index(), Some(3));
        assert_eq!(rc.novel_bases(), b"ACG");
        assert_eq!(rc.reverse_complement(), sequence);
    }
}
