// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Consensus assembly of the reads supporting a junction.

pub mod assembler;
pub mod junction_assembly;
pub mod mismatches;
pub mod sequence;
pub mod splitter;
pub mod support;

pub use assembler::JunctionAssembler;
pub use junction_assembly::JunctionAssembly;
pub use mismatches::{BaseMismatch, BaseMismatches, SequenceMismatches};
pub use sequence::{AssemblySequence, OrientedSequence};
pub use splitter::split_on_mismatches;
pub use support::{AssemblySupport, SupportType};

/// Final classification of an assembly after phasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum AssemblyOutcome {
    #[strum(serialize = "UNSET")]
    Unset,
    #[strum(serialize = "LINKED")]
    Linked,
    #[strum(serialize = "NO_LINK")]
    NoLink,
    #[strum(serialize = "SECONDARY")]
    Secondary,
    #[strum(serialize = "SUPP_ONLY")]
    SuppOnly,
}

impl Default for AssemblyOutcome {
    fn default() -> Self {
        AssemblyOutcome::Unset
    }
}
