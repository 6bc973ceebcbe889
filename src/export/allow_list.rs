//! Optional allow-list restricting which shots end up in the scene.
//!
//! The list is a plain text file, one shot id per line. When no list is
//! given, every shot is eligible.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::export::ExportError;

/// The set of shot ids eligible for export.
///
/// Purely a membership structure: blank lines and duplicates in the source
/// file collapse harmlessly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShotAllowList {
    shots: HashSet<String>,
}

impl ShotAllowList {
    /// Build an allow-list from line-oriented text, trimming surrounding
    /// whitespace and dropping blank lines.
    pub fn from_lines(text: &str) -> Self {
        let shots = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { shots }
    }

    pub fn contains(&self, shot_id: &str) -> bool {
        self.shots.contains(shot_id)
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

/// Read the optional allow-list file.
///
/// `Ok(None)` means "no list given, export everything".
pub fn load_allow_list(path: Option<&Path>) -> Result<Option<ShotAllowList>, ExportError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(Some(ShotAllowList::from_lines(&text)))
        }
        None => Ok(None),
    }
}
