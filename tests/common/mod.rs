// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use rust_htslib::bam::record::{Cigar, CigarString};

use junction_assembler::reads::{ReadBuilder, SupplementaryAlignment};
use junction_assembler::Read;

/// Reference bases left of a forward breakpoint at 1:110.
pub(crate) const REFERENCE: &[u8] = b"ACGTTGCAAC";
/// Sequence joined to the breakpoint, aligned at 2:500 onwards.
pub(crate) const NOVEL: &[u8] = b"TGCATCCGATTGACCTAGGCTAACGTTCAGGATCCAGTGA";
/// Unaligned sequence preceding REFERENCE.
pub(crate) const UPSTREAM: &[u8] = b"GATCCTAGGCATTACGGATCAGTCC";

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn substitute(base: u8) -> u8 {
    match base {
        b'A' => b'C',
        b'C' => b'G',
        b'G' => b'T',
        _ => b'A',
    }
}

pub(crate) struct TestRead {
    id: String,
    builder: ReadBuilder,
}

impl TestRead {
    pub(crate) fn new(
        id: &str,
        chromosome: &str,
        bases: Vec<u8>,
        start: i32,
        cigar: Vec<Cigar>,
    ) -> Self {
        let mut builder = ReadBuilder::default();
        builder
            .id(id)
            .chromosome(chromosome)
            .base_quals(vec![30; bases.len()])
            .bases(bases)
            .alignment_start(start)
            .cigar(CigarString(cigar));
        TestRead {
            id: id.to_owned(),
            builder,
        }
    }

    pub(crate) fn supplementary(mut self, sa: &str) -> Self {
        self.builder
            .supplementary_alignment(SupplementaryAlignment::parse(&self.id, sa).unwrap());
        self
    }

    pub(crate) fn mate(mut self, chromosome: &str, start: i32, reverse: bool) -> Self {
        self.builder
            .is_paired(true)
            .mate_chromosome(chromosome)
            .mate_alignment_start(start)
            .is_mate_reverse_strand(reverse);
        self
    }

    pub(crate) fn build(self) -> Arc<Read> {
        Arc::new(self.builder.build().unwrap())
    }
}

/// Forward read aligned to 1:101-110, clipped after the breakpoint, with substitutions at the
/// given indices of its clipped bases.
pub(crate) fn forward_clipped(id: &str, novel_length: usize, substitutions: &[usize]) -> Arc<Read> {
    let mut novel = NOVEL[..novel_length].to_vec();
    for &i in substitutions {
        novel[i] = substitute(novel[i]);
    }
    let bases = [REFERENCE, &novel[..]].concat();
    TestRead::new(
        id,
        "1",
        bases,
        101,
        vec![Cigar::Match(10), Cigar::SoftClip(novel_length as u32)],
    )
    .build()
}

/// The other side of the breakpoint: aligned from 2:500 onwards, with the bases of chromosome 1
/// clipped on its left.
pub(crate) fn reverse_clipped(id: &str) -> TestRead {
    let bases = [UPSTREAM, REFERENCE, NOVEL].concat();
    TestRead::new(
        id,
        "2",
        bases,
        500,
        vec![
            Cigar::SoftClip((UPSTREAM.len() + REFERENCE.len()) as u32),
            Cigar::Match(NOVEL.len() as u32),
        ],
    )
}
