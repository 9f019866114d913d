// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("assembly at junction {junction} already belongs to phase group {existing}, cannot add it to phase group {requested}")]
    AssemblyInMultiplePhaseGroups {
        junction: String,
        existing: usize,
        requested: usize,
    },
    #[error("invalid orientation '{value}', must be '+', '-', '1' or '-1'")]
    InvalidOrientation { value: String },
    #[error("invalid junction record at line {line}: {msg}")]
    InvalidJunctionRecord { line: usize, msg: String },
    #[error("invalid SA tag '{value}' in read {read}")]
    InvalidSupplementaryTag { read: String, value: String },
    #[error("read {read} has {bases} bases but {quals} base qualities")]
    InconsistentReadLength {
        read: String,
        bases: usize,
        quals: usize,
    },
    #[error("read {read} has {bases} bases but its CIGAR covers {cigar_length}")]
    CigarLengthMismatch {
        read: String,
        bases: usize,
        cigar_length: usize,
    },
    #[error("read {read} is unmapped or lacks a reference sequence")]
    UnmappedRead { read: String },
    #[error("invalid assembly configuration in {path:?}: {msg}")]
    InvalidConfig { path: PathBuf, msg: String },
    #[error("read {read} on chromosome {read_chromosome} was offered to junction {junction}")]
    ReadChromosomeMismatch {
        read: String,
        read_chromosome: String,
        junction: String,
    },
    #[error("phase group {index} does not exist")]
    UnknownPhaseGroup { index: usize },
}
