//! Merge one named profile from a freshly downloaded file into a target file.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::file::ProfileFile;
use crate::header::Dialect;

/// Which merge policy applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Both files had the profile; the target's entry was updated in place.
    UpdatedExisting,
    /// The target had the profile and the source only a default one.
    UpdatedFromDefault,
    /// The source's default profile was copied into the target under the name.
    InsertedFromDefault,
    /// The source's named profile was appended to the target as is.
    InsertedNamed,
    /// Nothing matched; the target was left as it was.
    Unchanged,
}

impl MergeOutcome {
    pub fn is_changed(self) -> bool {
        self != MergeOutcome::Unchanged
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MergeOutcome::UpdatedExisting => "updated existing profile",
            MergeOutcome::UpdatedFromDefault => "updated from source default profile",
            MergeOutcome::InsertedFromDefault => "inserted from source default profile",
            MergeOutcome::InsertedNamed => "inserted named profile",
            MergeOutcome::Unchanged => "unchanged",
        };
        f.write_str(text)
    }
}

/// Source and target collections plus where the target lives on disk.
#[derive(Debug, Clone)]
pub struct CredentialsModifier {
    source: ProfileFile,
    target: ProfileFile,
    target_path: PathBuf,
}

impl CredentialsModifier {
    pub fn new(source: ProfileFile, target: ProfileFile, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            target,
            target_path: target_path.into(),
        }
    }

    /// Load both files. The source is read with the target's dialect so that
    /// any profile copied across renders its header the target's way.
    pub fn from_paths(source: &Path, target: &Path, dialect: Dialect) -> Result<Self> {
        let source_file = ProfileFile::load(source, dialect)?;
        let target_file = ProfileFile::load(target, dialect)?;
        log::debug!(
            "Loaded {} source profiles from {} and {} target profiles from {}",
            source_file.len(),
            source.display(),
            target_file.len(),
            target.display()
        );
        Ok(Self::new(source_file, target_file, target))
    }

    pub fn source(&self) -> &ProfileFile {
        &self.source
    }

    pub fn target(&self) -> &ProfileFile {
        &self.target
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Apply the first matching policy to the in-memory target:
    ///
    /// 1. both have `profile_name`: update the target's entry from the source's
    /// 2. the target has it and the source holds only a default profile:
    ///    update the target's entry from that default
    /// 3. the source holds only a default profile: add a renamed copy of it
    /// 4. the source has `profile_name`: add it as is
    pub fn merge(&mut self, profile_name: &str) -> MergeOutcome {
        let in_source = self.source.get(profile_name);
        let in_target = self.target.has(profile_name);
        let only_default = self
            .source
            .get_default()
            .filter(|_| self.source.has_only_default());

        let outcome = match (in_source, only_default) {
            (Some(named), _) if in_target => {
                self.target.update(named.clone());
                MergeOutcome::UpdatedExisting
            }
            (_, Some(default)) if in_target => {
                self.target.update_as(profile_name, default);
                MergeOutcome::UpdatedFromDefault
            }
            (_, Some(default)) => {
                let mut renamed = default.clone();
                if !renamed.set_profile_name(Some(profile_name)) {
                    log::error!(
                        "Cannot add profile {:?}: not a valid profile name",
                        profile_name
                    );
                    MergeOutcome::Unchanged
                } else if self.target.add(renamed) {
                    MergeOutcome::InsertedFromDefault
                } else {
                    MergeOutcome::Unchanged
                }
            }
            (Some(named), None) => {
                if self.target.add(named.clone()) {
                    MergeOutcome::InsertedNamed
                } else {
                    MergeOutcome::Unchanged
                }
            }
            (None, None) => MergeOutcome::Unchanged,
        };

        log::debug!("Merge of profile {}: {}", profile_name, outcome);
        outcome
    }

    /// Merge and then rewrite the target file. The file is written even when
    /// nothing changed.
    pub fn run(&mut self, profile_name: &str) -> Result<MergeOutcome> {
        let outcome = self.merge(profile_name);
        self.target.save(&self.target_path)?;
        Ok(outcome)
    }
}
