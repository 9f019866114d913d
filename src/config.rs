// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::convert::TryFrom;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::Error;

pub const DEFAULT_LOW_BASE_QUAL_THRESHOLD: u8 = 26;
pub const DEFAULT_MIN_VARIANT_LENGTH: usize = 32;
pub const DEFAULT_MIN_SPLIT_SEQUENCE_LENGTH: usize = 30;
pub const DEFAULT_MIN_INDEL_SUPPORT_LENGTH: u32 = 3;
pub const DEFAULT_REMOTE_REGION_WEAK_SUPP_FRACTION: f64 = 0.3;

/// Thresholds consumed by the assembly, splitting, remote region and phasing stages.
///
/// Every field has a default, so a YAML file only needs to list the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Base qualities below this value never create a mismatch and yield to confident bases.
    pub low_base_qual_threshold: u8,
    /// Minimum novel sequence length for an assembly to be kept.
    pub min_variant_length: usize,
    /// Minimum aligned span of a read before its mismatches may define a split.
    pub min_split_sequence_length: usize,
    /// Minimum CIGAR insertion or deletion length for a read to support an indel junction.
    pub min_indel_support_length: u32,
    /// Supplementary-only remote regions below this share of the strongest evidence are purged.
    pub remote_region_weak_supp_fraction: f64,
    /// Minimum repeat-trimmed soft clip length of a seed read.
    pub min_soft_clip_length: usize,
    /// Junctions further apart than this start a new junction group.
    pub junction_group_max_distance: i32,
    /// Mismatches tolerated when a candidate read is tested against an assembly.
    pub assembly_read_permitted_mismatches: usize,
    /// Mismatches tolerated when unassigned reads are re-attached after a split.
    pub split_permitted_mismatches: usize,
    /// Fragment length beyond which a pair counts as discordant.
    pub max_fragment_length: i32,
    /// Remote regions closer than this are merged.
    pub remote_region_merge_margin: i32,
    /// Exact bases required to seed an overlap between two assemblies.
    pub link_overlap_bases: usize,
    /// Mismatches tolerated across the overlap of a split link.
    pub link_permitted_mismatches: usize,
    /// Maximum distance between the junctions of a facing link.
    pub facing_link_max_distance: i32,
    /// Minimum number of fragments for a discordant group to be kept.
    pub discordant_group_min_reads: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            low_base_qual_threshold: DEFAULT_LOW_BASE_QUAL_THRESHOLD,
            min_variant_length: DEFAULT_MIN_VARIANT_LENGTH,
            min_split_sequence_length: DEFAULT_MIN_SPLIT_SEQUENCE_LENGTH,
            min_indel_support_length: DEFAULT_MIN_INDEL_SUPPORT_LENGTH,
            remote_region_weak_supp_fraction: DEFAULT_REMOTE_REGION_WEAK_SUPP_FRACTION,
            min_soft_clip_length: 32,
            junction_group_max_distance: 1000,
            assembly_read_permitted_mismatches: 2,
            split_permitted_mismatches: 1,
            max_fragment_length: 1000,
            remote_region_merge_margin: 500,
            link_overlap_bases: 20,
            link_permitted_mismatches: 1,
            facing_link_max_distance: 1000,
            discordant_group_min_reads: 2,
        }
    }
}

impl AssemblyConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(AssemblyConfig::try_from(yaml)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read assembly configuration {:?}", path))?;
        AssemblyConfig::try_from(content.as_str()).map_err(|e| {
            Error::InvalidConfig {
                path: path.to_owned(),
                msg: e.to_string(),
            }
            .into()
        })
    }
}

impl<'a> TryFrom<&'a str> for AssemblyConfig {
    type Error = serde_yaml::Error;

    fn try_from(yaml: &str) -> Result<Self, Self::Error> {
        serde_yaml::from_str(yaml)
    }
}
