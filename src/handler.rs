//! Reacts to a freshly downloaded credentials file.
//!
//! The default profile of the source file is resolved to an account id, the
//! account id is mapped to a profile name and that profile is merged into the
//! target file. Missing preconditions are logged and the event is dropped;
//! only I/O failures are returned as errors.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use credsync_profile::{
    CredentialsModifier, Dialect, MergeOutcome, ProfileFile, ProfileNameMapper,
};
use credsync_watcher::FileEventHandler;

use crate::identity::{AccountResolver, Credentials};

/// What one pass over the source file did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Merged {
        profile: String,
        outcome: MergeOutcome,
    },
    NoDefaultProfile,
    IncompleteCredentials,
    AccountUnresolved,
    ProfileUnmapped {
        account_id: String,
    },
}

pub struct CredentialsEventHandler<R> {
    target: PathBuf,
    dialect: Dialect,
    mapper: ProfileNameMapper,
    resolver: R,
    default_region: String,
}

impl<R: AccountResolver> CredentialsEventHandler<R> {
    pub fn new(
        target: impl Into<PathBuf>,
        dialect: Dialect,
        mapper: ProfileNameMapper,
        resolver: R,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            dialect,
            mapper,
            resolver,
            default_region: default_region.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Merge the account's profile from `source` into the target file.
    pub fn handle(&mut self, source: &Path) -> Result<HandleOutcome> {
        let source_file = ProfileFile::load(source, self.dialect)
            .with_context(|| format!("Failed to load {}", source.display()))?;

        let Some(default) = source_file.get_default() else {
            log::error!(
                "Cannot update profile: expected a default profile in the newly downloaded \
                 credentials file {}, none found",
                source.display()
            );
            return Ok(HandleOutcome::NoDefaultProfile);
        };

        let Some(credentials) = Credentials::from_profile(default, &self.default_region) else {
            log::error!(
                "Default profile in {} has no access key id or secret key",
                source.display()
            );
            return Ok(HandleOutcome::IncompleteCredentials);
        };

        let account_id = match self.resolver.resolve(&credentials) {
            Ok(Some(id)) => id,
            Ok(None) => {
                log::error!("Could not get account id of new credentials download");
                return Ok(HandleOutcome::AccountUnresolved);
            }
            Err(e) => {
                log::error!("Could not get account id of new credentials download: {e:#}");
                return Ok(HandleOutcome::AccountUnresolved);
            }
        };

        let Some(profile) = self.mapper.profile_name(&account_id).map(str::to_string) else {
            log::error!("Could not match a profile name for account id {}", account_id);
            return Ok(HandleOutcome::ProfileUnmapped { account_id });
        };

        let target_file = ProfileFile::load(&self.target, self.dialect)
            .with_context(|| format!("Failed to load {}", self.target.display()))?;
        let mut modifier = CredentialsModifier::new(source_file, target_file, &self.target);
        let outcome = modifier
            .run(&profile)
            .with_context(|| format!("Failed to write {}", self.target.display()))?;

        log::info!("Profile {} has been updated ({})", profile, outcome);
        Ok(HandleOutcome::Merged { profile, outcome })
    }
}

impl<R: AccountResolver> FileEventHandler for CredentialsEventHandler<R> {
    fn on_create(&mut self, path: &Path) -> Result<()> {
        self.handle(path).map(|_| ())
    }

    fn on_update(&mut self, path: &Path) -> Result<()> {
        self.handle(path).map(|_| ())
    }

    fn on_delete(&mut self, path: &Path) {
        log::info!("\"{}\" has been deleted", path.display());
    }
}
