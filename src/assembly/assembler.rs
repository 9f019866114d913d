// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use anyhow::Result;

use crate::assembly::junction_assembly::{novel_extension, novel_read_bases, JunctionAssembly};
use crate::assembly::splitter::split_on_mismatches;
use crate::assembly::support::SupportType;
use crate::config::AssemblyConfig;
use crate::errors::Error;
use crate::junction::{Junction, Orientation};
use crate::reads::Read;
use crate::remote::collect_remote_regions;
use crate::utils::repeats::trimmed_length;

/// Builds the assemblies of single junctions from their candidate reads.
#[derive(Debug, Clone, new)]
pub struct JunctionAssembler<'a> {
    config: &'a AssemblyConfig,
}

impl<'a> JunctionAssembler<'a> {
    /// Soft clipped exactly at the junction, on its novel side.
    fn is_junction_read(&self, read: &Read, junction: &Junction) -> bool {
        if read.clip_length_towards(junction.orientation()) == 0 {
            return false;
        }
        match junction.orientation() {
            Orientation::Forward => read.alignment_end() == junction.position(),
            Orientation::Reverse => read.alignment_start() == junction.position(),
        }
    }

    /// Discordant pair on the reference side of the junction, pointing towards it.
    fn is_discordant_support(&self, read: &Read, junction: &Junction) -> bool {
        let max_distance = self.config.max_fragment_length;
        if !read.is_discordant(max_distance) {
            return false;
        }
        match junction.orientation() {
            Orientation::Forward => {
                !read.is_reverse_strand()
                    && read.alignment_end() <= junction.position()
                    && junction.position() - read.alignment_end() <= max_distance
            }
            Orientation::Reverse => {
                read.is_reverse_strand()
                    && read.alignment_start() >= junction.position()
                    && read.alignment_start() - junction.position() <= max_distance
            }
        }
    }

    fn min_seed_extension(&self, junction: &Junction) -> usize {
        if junction.indel_based() {
            self.config.min_indel_support_length as usize
        } else {
            self.config.min_soft_clip_length
        }
    }

    /// Assemble the reads around `junction`.
    ///
    /// Yields no assembly if no read qualifies as seed. Every resulting assembly has been
    /// split on mismatches, extended into the reference and annotated with repeats and
    /// remote regions.
    pub fn process_junction(
        &self,
        junction: &Junction,
        reads: &[Arc<Read>],
    ) -> Result<Vec<JunctionAssembly>> {
        if let Some(read) = reads.iter().find(|r| r.chromosome() != junction.chromosome()) {
            return Err(Error::ReadChromosomeMismatch {
                read: read.id().to_owned(),
                read_chromosome: read.chromosome().to_owned(),
                junction: junction.to_string(),
            }
            .into());
        }

        let mut junction_reads: Vec<(Arc<Read>, SupportType)> = Vec::new();
        let mut other_reads = Vec::new();
        for read in reads {
            if self.is_junction_read(read, junction) {
                junction_reads.push((Arc::clone(read), SupportType::Junction));
            } else if read.indel_at_junction(junction, self.config.min_indel_support_length) {
                junction_reads.push((Arc::clone(read), SupportType::Indel));
            } else {
                other_reads.push(read);
            }
        }

        // longest repeat-trimmed extension, earliest read on ties
        let min_seed_extension = self.min_seed_extension(junction);
        let seed = junction_reads
            .iter()
            .enumerate()
            .filter_map(|(i, (read, _))| {
                novel_read_bases(read, junction).map(|novel| (i, trimmed_length(novel)))
            })
            .filter(|(_, length)| *length >= min_seed_extension)
            .fold(None, |best: Option<(usize, usize)>, (i, length)| match best {
                Some((_, best_length)) if best_length >= length => best,
                _ => Some((i, length)),
            });
        let seed = match seed {
            Some((i, _)) => i,
            None => {
                debug!(
                    "no seed read among {} junction reads at {}",
                    junction_reads.len(),
                    junction
                );
                return Ok(Vec::new());
            }
        };
        let seed_read = junction_reads.remove(seed);
        junction_reads.insert(0, seed_read);

        let mut assembly = match JunctionAssembly::from_reads(
            junction.clone(),
            &junction_reads,
            self.config.low_base_qual_threshold,
        ) {
            Some(assembly) => assembly,
            None => return Ok(Vec::new()),
        };

        for read in other_reads {
            let extends = novel_extension(read, junction).map_or(false, |length| length > 0);
            if extends
                && assembly.novel_overlap(read) > 0
                && assembly.check_read_matches(read, self.config.assembly_read_permitted_mismatches)
            {
                assembly.add_read(Arc::clone(read), SupportType::Candidate, true);
            } else if junction_reads.iter().any(|(r, _)| r.matches_fragment(read)) {
                assembly.add_support_without_bases(Arc::clone(read), SupportType::JunctionMate);
            } else if self.is_discordant_support(read, junction) {
                assembly.add_support_without_bases(Arc::clone(read), SupportType::Discordant);
            }
        }

        let assemblies = match split_on_mismatches(&assembly, self.config) {
            Some(split) => split,
            None => vec![assembly],
        };

        let assemblies: Vec<JunctionAssembly> = assemblies
            .into_iter()
            .map(|mut assembly| {
                assembly.expand_reference_bases();
                assembly.build_repeat_info();
                let remote_regions = collect_remote_regions(&assembly, self.config);
                assembly.set_remote_regions(remote_regions);
                assembly
            })
            .filter(|assembly| {
                let keep = junction.indel_based()
                    || assembly.extension_length() >= self.config.min_variant_length;
                if !keep {
                    debug!("discarding short assembly {}", assembly);
                }
                keep
            })
            .collect();

        debug!("junction {}: {} assemblies", junction, assemblies.len());
        Ok(assemblies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::{Cigar, CigarString};

    const REFERENCE: &[u8] = b"ACGTTGCAAC";
    const NOVEL: &[u8] = b"TGCATCCGATTGACCTAGGCTAACGTTCAGGATCCAGTGA";

    fn clipped(id: &str, novel_length: usize) -> Arc<Read> {
        let bases = [REFERENCE, &NOVEL[..novel_length]].concat();
        Arc::new(
            TestRead::new(id, bases, 101)
                .cigar(vec![Cigar::Match(10), Cigar::SoftClip(novel_length as u32)])
                .build(),
        )
    }

    /// Keeps the test reads short to write.
    struct TestRead {
        builder: crate::reads::ReadBuilder,
    }

    impl TestRead {
        fn new(id: &str, bases: Vec<u8>, start: i32) -> Self {
            let mut builder = crate::reads::ReadBuilder::default();
            builder
                .id(id)
                .chromosome("1")
                .base_quals(vec![30; bases.len()])
                .bases(bases)
                .alignment_start(start);
            TestRead { builder }
        }

        fn cigar(mut self, cigar: Vec<Cigar>) -> Self {
            self.builder.cigar(CigarString(cigar));
            self
        }

        fn discordant(mut self) -> Self {
            self.builder
                .is_paired(true)
                .mate_chromosome("5")
                .mate_alignment_start(1000)
                .is_mate_reverse_strand(true);
            self
        }

        fn build(self) -> Read {
            self.builder.build().unwrap()
        }
    }

    #[test]
    fn test_process_junction() {
        let config = AssemblyConfig::default();
        let assembler = JunctionAssembler::new(&config);
        let junction = Junction::forward("1", 110);

        let candidate_bases = [REFERENCE, &NOVEL[..10]].concat();
        let reads = vec![
            clipped("j2", 35),
            clipped("j1", 40),
            Arc::new(
                TestRead::new("cand", candidate_bases, 101)
                    .cigar(vec![Cigar::Match(20)])
                    .build(),
            ),
            Arc::new(
                TestRead::new("j1", vec![b'A'; 20], 500)
                    .cigar(vec![Cigar::Match(20)])
                    .build(),
            ),
            Arc::new(
                TestRead::new("d1", vec![b'A'; 30], 60)
                    .cigar(vec![Cigar::Match(30)])
                    .discordant()
                    .build(),
            ),
            Arc::new(
                TestRead::new("x", vec![b'A'; 20], 3000)
                    .cigar(vec![Cigar::Match(20)])
                    .build(),
            ),
        ];

        let assemblies = assembler.process_junction(&junction, &reads).unwrap();
        assert_eq!(assemblies.len(), 1);
        let assembly = &assemblies[0];

        let support: Vec<_> = assembly
            .support()
            .iter()
            .map(|s| (s.read().id().as_str(), s.support_type()))
            .collect();
        assert_eq!(
            support,
            vec![
                ("j1", SupportType::Junction),
                ("j2", SupportType::Junction),
                ("cand", SupportType::Candidate),
                ("j1", SupportType::JunctionMate),
                ("d1", SupportType::Discordant),
            ]
        );
        assert_eq!(*assembly.bases(), [REFERENCE, NOVEL].concat());
        assert_eq!(assembly.junction_index(), 9);
        assert!(assembly.mismatches().is_empty());
        assert!(assembly.repeat_info().is_empty());

        assert_eq!(assembly.remote_regions().len(), 1);
        let region = &assembly.remote_regions()[0];
        assert_eq!(region.chromosome(), "5");
        assert_eq!(region.discordant_count(), 1);
    }

    #[test]
    fn test_no_seed() {
        let config = AssemblyConfig::default();
        let assembler = JunctionAssembler::new(&config);
        let reads = vec![clipped("a", 20), clipped("b", 31)];
        let assemblies = assembler
            .process_junction(&Junction::forward("1", 110), &reads)
            .unwrap();
        assert!(assemblies.is_empty());
    }

    #[test]
    fn test_short_assemblies_are_dropped() {
        let config = AssemblyConfig {
            min_variant_length: 41,
            ..Default::default()
        };
        let assembler = JunctionAssembler::new(&config);
        let assemblies = assembler
            .process_junction(&Junction::forward("1", 110), &[clipped("a", 40)])
            .unwrap();
        assert!(assemblies.is_empty());
    }

    #[test]
    fn test_reads_from_other_chromosome() {
        let config = AssemblyConfig::default();
        let assembler = JunctionAssembler::new(&config);
        let result = assembler.process_junction(&Junction::forward("2", 110), &[clipped("a", 40)]);
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ReadChromosomeMismatch { .. })
        ));
    }
}
