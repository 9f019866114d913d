// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Two-pass driver: parallel per-junction assembly, then phasing over all assemblies.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;

use crate::assembly::{JunctionAssembler, JunctionAssembly};
use crate::config::AssemblyConfig;
use crate::junction::{Junction, JunctionGroup};
use crate::phasing::{
    assign_outcomes, build_discordant_groups, PhaseGroup, PhaseGroupBuilder, PhaseSet,
    PhaseSetBuilder,
};
use crate::reads::Read;

/// Assemblies tagged with their outcome, and the phase groups formed over them.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct PhasingResult {
    assemblies: Vec<JunctionAssembly>,
    phase_groups: Vec<PhaseGroup>,
}

impl PhasingResult {
    pub fn phase_sets(&self) -> impl Iterator<Item = &PhaseSet> {
        self.phase_groups
            .iter()
            .flat_map(|group| group.phase_sets().iter())
    }

    pub fn into_assemblies(self) -> Vec<JunctionAssembly> {
        self.assemblies
    }
}

fn assemble_junction<F>(
    process: &F,
    group: &JunctionGroup,
    junction: &Junction,
    window: i32,
) -> Vec<JunctionAssembly>
where
    F: Fn(&Junction, &[Arc<Read>]) -> Result<Vec<JunctionAssembly>>,
{
    let reads = group.candidate_reads_for(junction, window);
    let result = panic::catch_unwind(AssertUnwindSafe(|| process(junction, &reads)));
    match result {
        Ok(Ok(assemblies)) => assemblies,
        Ok(Err(e)) => {
            warn!("skipping junction {}: {}", junction, e);
            Vec::new()
        }
        Err(_) => {
            warn!("skipping junction {}: assembly panicked", junction);
            Vec::new()
        }
    }
}

/// Assemble every junction of every group, one junction per task.
///
/// A junction whose assembly fails is logged and contributes nothing; the other junctions
/// are unaffected. Assemblies are returned in group and junction order.
pub fn run_assembly(groups: &[JunctionGroup], config: &AssemblyConfig) -> Vec<JunctionAssembly> {
    let assembler = JunctionAssembler::new(config);
    run_junction_tasks(groups, config.max_fragment_length, |junction, reads| {
        assembler.process_junction(junction, reads)
    })
}

fn run_junction_tasks<F>(groups: &[JunctionGroup], window: i32, process: F) -> Vec<JunctionAssembly>
where
    F: Fn(&Junction, &[Arc<Read>]) -> Result<Vec<JunctionAssembly>> + Sync,
{
    let tasks: Vec<(&JunctionGroup, &Junction)> = groups
        .iter()
        .flat_map(|group| group.junctions().iter().map(move |junction| (group, junction)))
        .collect();

    let assemblies: Vec<JunctionAssembly> = tasks
        .par_iter()
        .map(|(group, junction)| assemble_junction(&process, group, junction, window))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    info!(
        "assembled {} junctions into {} assemblies",
        tasks.len(),
        assemblies.len()
    );
    assemblies
}

/// Phase all assemblies after assembly has finished.
///
/// Builds phase groups, attaches groups of unassigned discordant reads, resolves each group
/// into phase sets and tags every assembly with its outcome. A phasing inconsistency aborts
/// with an error.
pub fn run_phasing(
    mut assemblies: Vec<JunctionAssembly>,
    discordant_reads: &[Arc<Read>],
    config: &AssemblyConfig,
) -> Result<PhasingResult> {
    let group_builder = PhaseGroupBuilder::new(config);
    let mut phase_groups = group_builder.build_phase_groups(&mut assemblies)?;

    let discordant_groups = build_discordant_groups(discordant_reads, &assemblies, config);
    group_builder.attach_discordant_groups(&mut phase_groups, discordant_groups, &assemblies);

    let set_builder = PhaseSetBuilder::new(config);
    for group in phase_groups.iter_mut() {
        set_builder.build(group, &assemblies);
    }

    assign_outcomes(&mut assemblies, &phase_groups);

    let result = PhasingResult {
        assemblies,
        phase_groups,
    };
    info!(
        "{} phase groups, {} phase sets",
        result.phase_groups.len(),
        result.phase_sets().count()
    );
    Ok(result)
}
