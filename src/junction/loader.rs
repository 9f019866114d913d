// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Loading of previously discovered junctions from a tab-separated file with the columns
//! `chromosome`, `position` and `orientation`.

use std::path::Path;

use anyhow::Result;

use crate::errors::Error;
use crate::junction::{Junction, Orientation};

#[derive(Debug, Deserialize)]
struct JunctionRecord {
    chromosome: String,
    position: i32,
    orientation: String,
}

impl JunctionRecord {
    fn into_junction(self, line: usize) -> Result<Junction> {
        let orientation = self
            .orientation
            .parse::<Orientation>()
            .map_err(|e| Error::InvalidJunctionRecord {
                line,
                msg: e.to_string(),
            })?;
        if self.position < 1 {
            return Err(Error::InvalidJunctionRecord {
                line,
                msg: format!("position {} is not 1-based", self.position),
            }
            .into());
        }
        Ok(Junction::new(self.chromosome, self.position, orientation))
    }
}

/// Read junctions, sorted. An unreadable file yields no junctions and invalid rows are
/// skipped, both with a warning.
pub fn load_junctions<P: AsRef<Path>>(path: P) -> Vec<Junction> {
    let path = path.as_ref();
    let mut reader = match csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
    {
        Ok(reader) => reader,
        Err(e) => {
            warn!("unable to read junction file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let mut junctions = Vec::new();
    for (i, record) in reader.deserialize::<JunctionRecord>().enumerate() {
        // header is line 1
        let line = i + 2;
        match record
            .map_err(anyhow::Error::from)
            .and_then(|record| record.into_junction(line))
        {
            Ok(junction) => junctions.push(junction),
            Err(e) => warn!("skipping junction in {:?}: {}", path, e),
        }
    }
    junctions.sort();

    info!("loaded {} junctions from {:?}", junctions.len(), path);
    junctions
}

/// Merge `loaded` into the sorted `existing` junctions, dropping duplicates.
pub fn merge_junctions(existing: &mut Vec<Junction>, loaded: Vec<Junction>) {
    let before = existing.len();
    existing.extend(loaded);
    existing.sort();
    // a locus found both ways keeps the indel flag
    existing.dedup_by(|duplicate, kept| {
        if duplicate == kept {
            kept.indel_based |= duplicate.indel_based;
            true
        } else {
            false
        }
    });
    debug!("merged junctions: {} -> {}", before, existing.len());
}
