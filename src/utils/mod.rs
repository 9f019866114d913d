// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

pub mod genomics;
pub mod repeats;

/// Index of a DNA base in a four slot table, `None` for anything but A, C, G or T.
pub(crate) fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Render bases as a string, showing unset positions as `-`.
pub fn bases_to_string(bases: &[u8]) -> String {
    bases
        .iter()
        .map(|b| if *b == 0 { '-' } else { *b as char })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_index() {
        assert_eq!(base_index(b'A'), Some(0));
        assert_eq!(base_index(b't'), Some(3));
        assert_eq!(base_index(b'N'), None);
        assert_eq!(base_index(0), None);
    }

    #[test]
    fn test_bases_to_string() {
        assert_eq!(bases_to_string(&[b'A', 0, b'C']), "A-C");
    }
}
