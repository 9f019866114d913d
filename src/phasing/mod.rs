// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Linking and phasing of assemblies.
//!
//! Assemblies live in a single arena (a slice owned by the caller). Phase groups, phase sets
//! and links refer to them by index, while each assembly records the id of its phase group.

pub mod discordant;
pub mod link;
pub mod phase_group;
pub mod phase_set;

pub use discordant::{build_discordant_groups, DiscordantGroup};
pub use link::{try_facing_link, try_split_link, AssemblyLink, LinkType, SvType};
pub use phase_group::{PhaseGroup, PhaseGroupBuilder};
pub use phase_set::{PhaseSet, PhaseSetBuilder};

use crate::assembly::{AssemblyOutcome, JunctionAssembly};

fn outcome(index: usize, assembly: &JunctionAssembly, groups: &[PhaseGroup]) -> AssemblyOutcome {
    let group = assembly.phase_group().and_then(|id| groups.get(id));
    let linked = group.map_or(false, |group| {
        group
            .phase_sets()
            .iter()
            .any(|phase_set| phase_set.has_assembly(index))
    });

    if linked {
        AssemblyOutcome::Linked
    } else if !assembly.remote_regions().is_empty()
        && assembly.remote_regions().iter().all(|r| r.is_supp_only())
    {
        AssemblyOutcome::SuppOnly
    } else {
        match group {
            Some(group) if group.has_secondary_links(index) => AssemblyOutcome::Secondary,
            _ => AssemblyOutcome::NoLink,
        }
    }
}

/// Tag every assembly with its final outcome, given the phase groups it was placed in.
pub fn assign_outcomes(assemblies: &mut [JunctionAssembly], groups: &[PhaseGroup]) {
    for (index, assembly) in assemblies.iter_mut().enumerate() {
        let outcome = outcome(index, assembly, groups);
        assembly.set_outcome(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblyConfig;
    use crate::junction::Orientation;
    use crate::phasing::link::tests::{single_read_assembly, split_pair};
    use crate::remote::{RemoteReadType, RemoteRegion};

    #[test]
    fn test_assign_outcomes() {
        let config = AssemblyConfig::default();
        let mut assemblies = split_pair(("1", 100), ("2", 500), b"");
        // a third assembly only anchored by a supplementary alignment
        let mut supp_only = single_read_assembly("s", "5", 100);
        supp_only.set_remote_regions(vec![RemoteRegion::new(
            "9",
            100,
            200,
            Orientation::Forward,
            "s",
            RemoteReadType::Supplementary,
            100,
        )]);
        assemblies.push(supp_only);
        assemblies.push(single_read_assembly("x", "7", 100));

        assemblies[0].set_remote_regions(vec![RemoteRegion::new(
            "2",
            500,
            540,
            Orientation::Reverse,
            "f",
            RemoteReadType::Mate,
            0,
        )]);

        let mut groups = PhaseGroupBuilder::new(&config)
            .build_phase_groups(&mut assemblies)
            .unwrap();
        assert_eq!(groups.len(), 1);
        for group in groups.iter_mut() {
            PhaseSetBuilder::new(&config).build(group, &assemblies);
        }
        assign_outcomes(&mut assemblies, &groups);

        let outcomes: Vec<_> = assemblies.iter().map(|a| a.outcome()).collect();
        assert_eq!(
            outcomes,
            vec![
                AssemblyOutcome::Linked,
                AssemblyOutcome::Linked,
                AssemblyOutcome::SuppOnly,
                AssemblyOutcome::NoLink,
            ]
        );
        let tags: Vec<&'static str> = outcomes.iter().map(|&o| o.into()).collect();
        assert_eq!(tags, ["LINKED", "LINKED", "SUPP_ONLY", "NO_LINK"]);
        assert_eq!(
            "SECONDARY".parse::<AssemblyOutcome>().unwrap(),
            AssemblyOutcome::Secondary
        );
    }
}
