// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Reverse;
use std::collections::HashSet;

use itertools::Itertools;

use crate::assembly::JunctionAssembly;
use crate::config::AssemblyConfig;
use crate::phasing::link::{try_facing_link, try_split_link, AssemblyLink};
use crate::phasing::phase_group::PhaseGroup;

/// A chain of links, each sharing one assembly with its neighbour.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct PhaseSet {
    #[getset(get = "pub")]
    links: Vec<AssemblyLink>,
    /// Assembly at the open end of the first link.
    #[getset(get_copy = "pub")]
    start_assembly: usize,
    /// Assembly at the open end of the last link.
    #[getset(get_copy = "pub")]
    end_assembly: usize,
}

impl PhaseSet {
    pub fn new(link: AssemblyLink) -> Self {
        PhaseSet {
            start_assembly: link.first(),
            end_assembly: link.second(),
            links: vec![link],
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn has_assembly(&self, index: usize) -> bool {
        self.links.iter().any(|link| link.has_assembly(index))
    }

    pub fn has_matching_link(&self, link: &AssemblyLink) -> bool {
        self.links.iter().any(|l| l.matches(link))
    }

    pub fn find_assembly_links(&self, index: usize) -> Vec<&AssemblyLink> {
        self.links
            .iter()
            .filter(|link| link.has_assembly(index))
            .collect()
    }

    /// Assemblies along the chain, from start to end.
    pub fn assemblies(&self) -> Vec<usize> {
        let mut assemblies = vec![self.start_assembly];
        let mut current = self.start_assembly;
        for link in &self.links {
            if let Some(next) = link.other_assembly(current) {
                assemblies.push(next);
                current = next;
            }
        }
        assemblies
    }

    /// A link extends the chain if it touches exactly one new assembly, attached at `end`.
    fn extends_at(&self, link: &AssemblyLink, end: usize) -> Option<usize> {
        if self.has_matching_link(link) {
            return None;
        }
        link.other_assembly(end)
            .filter(|other| !self.has_assembly(*other))
    }

    /// Prepend `link` if it connects to the start of the chain, else hand it back.
    pub fn add_link_start(&mut self, link: AssemblyLink) -> Result<(), AssemblyLink> {
        match self.extends_at(&link, self.start_assembly) {
            Some(other) => {
                self.start_assembly = other;
                self.links.insert(0, link);
                Ok(())
            }
            None => Err(link),
        }
    }

    /// Append `link` if it connects to the end of the chain.
    pub fn add_link_end(&mut self, link: AssemblyLink) -> Result<(), AssemblyLink> {
        match self.extends_at(&link, self.end_assembly) {
            Some(other) => {
                self.end_assembly = other;
                self.links.push(link);
                Ok(())
            }
            None => Err(link),
        }
    }
}

/// Resolves the links within a phase group into phase sets.
#[derive(Debug, Clone, new)]
pub struct PhaseSetBuilder<'a> {
    config: &'a AssemblyConfig,
}

impl<'a> PhaseSetBuilder<'a> {
    fn shared_fragments(assemblies: &[JunctionAssembly], a: usize, b: usize) -> usize {
        let ids: HashSet<&str> = assemblies[a]
            .support_reads()
            .map(|read| read.id().as_str())
            .collect();
        assemblies[b]
            .support_reads()
            .map(|read| read.id().as_str())
            .unique()
            .filter(|id| ids.contains(id))
            .count()
    }

    /// Split links ranked by overlap and shared fragments. Each assembly takes part in at most
    /// one primary split link, the others become secondary.
    fn split_links(
        &self,
        group: &PhaseGroup,
        assemblies: &[JunctionAssembly],
    ) -> (Vec<AssemblyLink>, Vec<AssemblyLink>) {
        let candidates = group
            .assemblies()
            .iter()
            .tuple_combinations()
            .filter_map(|(&a, &b)| try_split_link(assemblies, a, b, self.config))
            .map(|link| {
                let shared = Self::shared_fragments(assemblies, link.first(), link.second());
                (link, shared)
            })
            .sorted_by_key(|(link, shared)| (Reverse(link.overlap_bases()), Reverse(*shared)))
            .map(|(link, _)| link);

        let mut used = HashSet::new();
        let mut primary = Vec::new();
        let mut secondary = Vec::new();
        for link in candidates {
            if used.contains(&link.first()) || used.contains(&link.second()) {
                secondary.push(link);
            } else {
                used.insert(link.first());
                used.insert(link.second());
                primary.push(link);
            }
        }
        (primary, secondary)
    }

    /// Facing links, shortest first, each assembly facing at most one other.
    fn facing_links(
        &self,
        group: &PhaseGroup,
        assemblies: &[JunctionAssembly],
        split_links: &[AssemblyLink],
    ) -> Vec<AssemblyLink> {
        let candidates = group
            .assemblies()
            .iter()
            .tuple_combinations()
            .filter_map(|(&a, &b)| try_facing_link(assemblies, a, b, self.config))
            .filter(|link| {
                !split_links.iter().any(|split| {
                    split.has_assembly(link.first()) && split.has_assembly(link.second())
                })
            })
            .sorted_by_key(|link| link.length());

        let mut used = HashSet::new();
        candidates
            .filter(|link| {
                if used.contains(&link.first()) || used.contains(&link.second()) {
                    false
                } else {
                    used.insert(link.first());
                    used.insert(link.second());
                    true
                }
            })
            .collect()
    }

    /// Grow chains from the primary links, each link used once.
    fn chain(links: Vec<AssemblyLink>) -> Vec<PhaseSet> {
        let mut remaining = links;
        let mut phase_sets = Vec::new();
        while !remaining.is_empty() {
            let mut phase_set = PhaseSet::new(remaining.remove(0));
            let mut i = 0;
            while i < remaining.len() {
                let link = remaining.remove(i);
                let link = match phase_set.add_link_end(link) {
                    Ok(()) => None,
                    Err(link) => phase_set.add_link_start(link).err(),
                };
                match link {
                    Some(link) => {
                        remaining.insert(i, link);
                        i += 1;
                    }
                    // the chain changed, earlier links may connect now
                    None => i = 0,
                }
            }
            phase_sets.push(phase_set);
        }
        phase_sets
    }

    /// Resolve the group's links into phase sets and record the secondary split links.
    pub fn build(&self, group: &mut PhaseGroup, assemblies: &[JunctionAssembly]) {
        let (primary, secondary) = self.split_links(group, assemblies);
        let facing = self.facing_links(group, assemblies, &primary);

        let links: Vec<AssemblyLink> = primary
            .into_iter()
            .chain(facing.into_iter())
            .collect();
        let link_count = links.len();
        let phase_sets = Self::chain(links);

        debug!(
            "phase group {}: {} links in {} phase sets, {} secondary",
            group.id(),
            link_count,
            phase_sets.len(),
            secondary.len()
        );
        for link in secondary {
            group.add_secondary_link(link);
        }
        group.set_phase_sets(phase_sets);
    }
}
