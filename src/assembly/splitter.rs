// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Separation of an assembly into distinct sequences when its supporting reads disagree
//! systematically.
//!
//! Reads without mismatches form the background sequence. Long reads with mismatches are
//! clustered by their mismatch signature, the ordered list of recorded alternate bases they
//! carry. Each cluster yields its own assembly, rebuilt from the junction and the cluster's
//! reads. Remaining reads attach to every resulting assembly they match.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::assembly::junction_assembly::{novel_extension, JunctionAssembly};
use crate::assembly::support::{AssemblySupport, SupportType};
use crate::config::AssemblyConfig;
use crate::reads::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MismatchKey {
    offset: i32,
    base: u8,
    max_qual: u8,
    qual_total: u32,
}

fn mismatch_signature(assembly: &JunctionAssembly, read: &Arc<Read>) -> Vec<MismatchKey> {
    assembly
        .mismatches()
        .iter()
        .flat_map(|(offset, mismatches)| {
            mismatches
                .iter()
                .filter(move |mismatch| mismatch.contains_read(read))
                .map(move |mismatch| MismatchKey {
                    offset,
                    base: mismatch.base(),
                    max_qual: mismatch.max_qual(),
                    qual_total: mismatch.qual_total(),
                })
        })
        .collect()
}

/// Component-wise equal up to the length of the shorter signature.
fn signatures_compatible(a: &[MismatchKey], b: &[MismatchKey]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Greedy clustering over signatures sorted by length. Equal lengths keep input order.
fn cluster_signatures<'a>(
    mut signatures: Vec<(&'a AssemblySupport, Vec<MismatchKey>)>,
) -> Vec<Vec<&'a AssemblySupport>> {
    signatures.sort_by_key(|(_, signature)| signature.len());

    let mut clustered = vec![false; signatures.len()];
    let mut clusters = Vec::new();
    for i in 0..signatures.len() {
        if clustered[i] {
            continue;
        }
        clustered[i] = true;
        let mut cluster = vec![signatures[i].0];
        for j in i + 1..signatures.len() {
            if !clustered[j] && signatures_compatible(&signatures[i].1, &signatures[j].1) {
                clustered[j] = true;
                cluster.push(signatures[j].0);
            }
        }
        clusters.push(cluster);
    }
    clusters
}

/// Split `assembly` by the mismatch signatures of its long reads.
///
/// Returns `None` if there is nothing to split on or fewer than two assemblies result, in
/// which case the caller keeps the original.
pub fn split_on_mismatches(
    assembly: &JunctionAssembly,
    config: &AssemblyConfig,
) -> Option<Vec<JunctionAssembly>> {
    if assembly.mismatches().is_empty() {
        return None;
    }

    let mut clean = Vec::new();
    let mut long_mismatch = Vec::new();
    let mut unassigned = Vec::new();
    let mut without_bases = Vec::new();

    for support in assembly.support() {
        if !support.support_type().contributes_bases() {
            without_bases.push(support);
        } else if support.mismatch_count() == 0 {
            clean.push(support);
        } else {
            let signature = if support.aligned_length() >= config.min_split_sequence_length {
                mismatch_signature(assembly, support.read())
            } else {
                Vec::new()
            };
            if signature.is_empty() {
                unassigned.push(support);
            } else {
                long_mismatch.push((support, signature));
            }
        }
    }

    if long_mismatch.is_empty() {
        return None;
    }

    let mut read_sets = Vec::new();
    if !clean.is_empty() {
        read_sets.push(clean);
    }
    read_sets.extend(cluster_signatures(long_mismatch));

    let junction = assembly.junction();
    let mut results: Vec<JunctionAssembly> = read_sets
        .into_iter()
        .filter_map(|supports| {
            let mut reads: Vec<(Arc<Read>, SupportType)> = supports
                .iter()
                .map(|support| (Arc::clone(support.read()), support.support_type()))
                .collect();
            reads.sort_by_key(|(read, _)| Reverse(novel_extension(read, junction).unwrap_or(0)));
            reads.extend(
                without_bases
                    .iter()
                    .map(|support| (Arc::clone(support.read()), support.support_type())),
            );
            JunctionAssembly::from_reads(
                junction.clone(),
                &reads,
                config.low_base_qual_threshold,
            )
        })
        .collect();

    for support in unassigned {
        for result in results.iter_mut() {
            if result.check_read_matches(support.read(), config.split_permitted_mismatches) {
                result.add_read(Arc::clone(support.read()), support.support_type(), true);
            }
        }
    }

    if results.len() < 2 {
        return None;
    }

    debug!(
        "split assembly at {} with {} reads into {} assemblies",
        junction,
        assembly.support_count(),
        results.len()
    );
    Some(results)
}
