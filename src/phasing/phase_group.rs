// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::mem;

use anyhow::Result;
use itertools::Itertools;

use crate::assembly::JunctionAssembly;
use crate::config::AssemblyConfig;
use crate::errors::Error;
use crate::phasing::discordant::DiscordantGroup;
use crate::phasing::link::{try_split_link, AssemblyLink};
use crate::phasing::phase_set::PhaseSet;

/// Assemblies that belong to the same rearrangement, referenced by their arena index.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct PhaseGroup {
    #[getset(get_copy = "pub")]
    id: usize,
    #[getset(get = "pub")]
    assemblies: Vec<usize>,
    #[getset(get = "pub")]
    discordant_groups: Vec<DiscordantGroup>,
    /// Split links that lost against a better link for one of their assemblies.
    #[getset(get = "pub")]
    secondary_split_links: Vec<AssemblyLink>,
    #[getset(get = "pub")]
    phase_sets: Vec<PhaseSet>,
}

impl PhaseGroup {
    pub fn new(id: usize) -> Self {
        PhaseGroup {
            id,
            assemblies: Vec::new(),
            discordant_groups: Vec::new(),
            secondary_split_links: Vec::new(),
            phase_sets: Vec::new(),
        }
    }

    pub fn has_assembly(&self, index: usize) -> bool {
        self.assemblies.contains(&index)
    }

    pub fn assembly_count(&self) -> usize {
        self.assemblies.len()
    }

    /// Add the assembly at `index` and tag it with this group.
    ///
    /// An assembly already tagged with another group is an inconsistency of the phasing
    /// graph and is reported as `Error::AssemblyInMultiplePhaseGroups`.
    pub fn add_assembly(&mut self, index: usize, assemblies: &mut [JunctionAssembly]) -> Result<()> {
        let assembly = &mut assemblies[index];
        match assembly.phase_group() {
            Some(existing) if existing == self.id => Ok(()),
            Some(existing) => Err(Error::AssemblyInMultiplePhaseGroups {
                junction: assembly.junction().to_string(),
                existing,
                requested: self.id,
            }
            .into()),
            None => {
                assembly.set_phase_group(Some(self.id));
                self.assemblies.push(index);
                Ok(())
            }
        }
    }

    /// Move all assemblies and discordant groups of `other` into this group.
    pub fn transfer_assemblies(
        &mut self,
        other: &mut PhaseGroup,
        assemblies: &mut [JunctionAssembly],
    ) -> Result<()> {
        for index in mem::take(&mut other.assemblies) {
            assemblies[index].set_phase_group(None);
            self.add_assembly(index, assemblies)?;
        }
        self.discordant_groups.append(&mut other.discordant_groups);
        Ok(())
    }

    pub fn add_discordant_group(&mut self, group: DiscordantGroup) {
        self.discordant_groups.push(group);
    }

    pub fn add_secondary_link(&mut self, link: AssemblyLink) {
        self.secondary_split_links.push(link);
    }

    /// Whether a secondary split link involves the assembly at `index`.
    pub fn has_secondary_links(&self, index: usize) -> bool {
        self.secondary_split_links
            .iter()
            .any(|link| link.has_assembly(index))
    }

    pub fn set_phase_sets(&mut self, phase_sets: Vec<PhaseSet>) {
        self.phase_sets = phase_sets;
    }

    fn renumber(&mut self, id: usize, assemblies: &mut [JunctionAssembly]) {
        self.id = id;
        for &index in &self.assemblies {
            assemblies[index].set_phase_group(Some(id));
        }
    }
}

/// Forms phase groups over an arena of assemblies.
#[derive(Debug, Clone, new)]
pub struct PhaseGroupBuilder<'a> {
    config: &'a AssemblyConfig,
}

impl<'a> PhaseGroupBuilder<'a> {
    /// Shared fragments, or a remote region of one assembly pointing at the other's junction
    /// backed by a split link.
    fn related(&self, assemblies: &[JunctionAssembly], a: usize, b: usize) -> bool {
        if assemblies[a].shares_fragment(&assemblies[b]) {
            return true;
        }
        let margin = self.config.max_fragment_length;
        let points_at = |from: usize, to: usize| {
            let junction = assemblies[to].junction();
            assemblies[from].remote_regions().iter().any(|region| {
                region.overlaps_position(junction.chromosome(), junction.position(), margin)
            })
        };
        (points_at(a, b) || points_at(b, a))
            && try_split_link(assemblies, a, b, self.config).is_some()
    }

    fn join(
        groups: &mut Vec<PhaseGroup>,
        a: usize,
        b: usize,
        assemblies: &mut [JunctionAssembly],
    ) -> Result<()> {
        match (assemblies[a].phase_group(), assemblies[b].phase_group()) {
            (None, None) => {
                let mut group = PhaseGroup::new(groups.len());
                group.add_assembly(a, assemblies)?;
                group.add_assembly(b, assemblies)?;
                groups.push(group);
            }
            (Some(existing), None) => group_mut(groups, existing)?.add_assembly(b, assemblies)?,
            (None, Some(existing)) => group_mut(groups, existing)?.add_assembly(a, assemblies)?,
            (Some(first), Some(second)) if first == second => (),
            (Some(first), Some(second)) => {
                let mut other = mem::replace(group_mut(groups, second)?, PhaseGroup::new(second));
                group_mut(groups, first)?.transfer_assemblies(&mut other, assemblies)?;
            }
        }
        Ok(())
    }

    /// Group all related assemblies. Assemblies split from the same junction are never
    /// related to each other. Group ids are dense and match the returned order.
    pub fn build_phase_groups(&self, assemblies: &mut [JunctionAssembly]) -> Result<Vec<PhaseGroup>> {
        let mut groups = Vec::new();
        for (a, b) in (0..assemblies.len()).tuple_combinations() {
            if assemblies[a].junction() == assemblies[b].junction() {
                continue;
            }
            if self.related(assemblies, a, b) {
                Self::join(&mut groups, a, b, assemblies)?;
            }
        }

        let mut groups: Vec<PhaseGroup> = groups
            .into_iter()
            .filter(|group| group.assembly_count() > 0)
            .collect();
        for (id, group) in groups.iter_mut().enumerate() {
            group.renumber(id, assemblies);
        }
        debug!(
            "{} phase groups over {} assemblies",
            groups.len(),
            assemblies.len()
        );
        Ok(groups)
    }

    /// Hand each discordant group to the first phase group holding an assembly it points at.
    pub fn attach_discordant_groups(
        &self,
        groups: &mut [PhaseGroup],
        discordant_groups: Vec<DiscordantGroup>,
        assemblies: &[JunctionAssembly],
    ) {
        let max_distance = self.config.max_fragment_length;
        for discordant_group in discordant_groups {
            let target = groups.iter_mut().find(|group| {
                group.assemblies().iter().any(|&index| {
                    discordant_group.points_to(assemblies[index].junction(), max_distance)
                })
            });
            match target {
                Some(group) => group.add_discordant_group(discordant_group),
                None => debug!(
                    "discordant group at {}:{}-{} matches no phase group",
                    discordant_group.chromosome(),
                    discordant_group.min_position(),
                    discordant_group.max_position()
                ),
            }
        }
    }
}

fn group_mut(groups: &mut [PhaseGroup], index: usize) -> Result<&mut PhaseGroup> {
    Ok(groups
        .get_mut(index)
        .ok_or(Error::UnknownPhaseGroup { index })?)
}
