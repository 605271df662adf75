//! An ordered collection of profiles read from one credentials or config file.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use crate::error::{ProfileError, Result};
use crate::header::{Dialect, ProfileHeader, ProfileKey};
use crate::profile::Profile;

/// Profiles keyed by identity, serialized in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct ProfileFile {
    /// All profiles indexed by key
    profiles: HashMap<ProfileKey, Profile>,

    /// Insertion order used for serialization
    order: Vec<ProfileKey>,

    dialect: Dialect,
}

impl ProfileFile {
    /// Create an empty collection.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            profiles: HashMap::new(),
            order: Vec::new(),
            dialect,
        }
    }

    /// Group `lines` into profiles.
    ///
    /// Each group starts at a header line and runs to the next one. Lines
    /// before the first header are dropped. A profile whose key was already
    /// seen is dropped with a warning and never replaces the first one.
    pub fn parse<I, S>(lines: I, dialect: Dialect) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut file = Self::new(dialect);
        let mut group: Vec<String> = Vec::new();

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }

            if ProfileHeader::is_header(line) {
                file.add_group(&mut group);
                group.push(line.to_string());
            } else if group.is_empty() {
                log::debug!("Skipping line before first profile header: {:?}", line);
            } else {
                group.push(line.to_string());
            }
        }
        file.add_group(&mut group);

        file
    }

    /// Parse from a block of text.
    pub fn from_text(text: &str, dialect: Dialect) -> Self {
        Self::parse(text.lines(), dialect)
    }

    /// Parse everything a reader yields.
    pub fn from_reader<R: BufRead>(reader: R, dialect: Dialect) -> io::Result<Self> {
        let lines = reader.lines().collect::<io::Result<Vec<_>>>()?;
        Ok(Self::parse(lines, dialect))
    }

    /// Load a file from disk; a file that does not exist yet loads as empty.
    pub fn load(path: &Path, dialect: Dialect) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_text(&text, dialect)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} does not exist, starting empty", path.display());
                Ok(Self::new(dialect))
            }
            Err(e) => Err(ProfileError::io(path, e)),
        }
    }

    /// Truncate and rewrite `path`, creating it when needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ProfileError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.persist(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| ProfileError::io(path, e))?;
        log::debug!("Wrote {} profiles to {}", self.len(), path.display());
        Ok(())
    }

    /// Write every profile's raw text, separated by blank lines.
    pub fn persist<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let text = self.to_string();
        if !text.is_empty() {
            writeln!(sink, "{text}")?;
        }
        Ok(())
    }

    fn add_group(&mut self, group: &mut Vec<String>) {
        if group.is_empty() {
            return;
        }
        let profile = Profile::parse(group.drain(..), self.dialect);
        let Some(key) = profile.key() else {
            return;
        };

        match self.profiles.get(&key) {
            Some(existing) if *existing == profile => {
                log::warn!("Profile [{}] encountered more than once", key);
            }
            Some(_) => {
                log::warn!(
                    "Profile [{}] appears again with different settings; keeping the first",
                    key
                );
            }
            None => {
                self.order.push(key.clone());
                self.profiles.insert(key, profile);
            }
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Append `profile` unless one with the same key is already present.
    ///
    /// Returns `false` (and logs) for duplicates and headerless profiles.
    pub fn add(&mut self, profile: Profile) -> bool {
        let Some(key) = profile.key() else {
            log::warn!("Refusing to add a profile without a header");
            return false;
        };
        if self.profiles.contains_key(&key) {
            log::warn!("Profile [{}] already exists, not adding", key);
            return false;
        }
        self.order.push(key.clone());
        self.profiles.insert(key, profile);
        true
    }

    /// Look a profile up by name; `"default"` finds the default profile.
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(&ProfileKey::for_name(Some(name)))
    }

    /// Callers must not rename the profile through this; the map key would
    /// no longer match its header.
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Profile> {
        self.profiles.get_mut(&ProfileKey::for_name(Some(name)))
    }

    pub fn get_default(&self) -> Option<&Profile> {
        self.profiles.get(&ProfileKey::Default)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_default(&self) -> bool {
        self.profiles.contains_key(&ProfileKey::Default)
    }

    /// Exactly one profile, and it is the default one.
    pub fn has_only_default(&self) -> bool {
        self.len() == 1 && self.has_default()
    }

    /// The first profile in file order.
    pub fn first(&self) -> Option<&Profile> {
        self.order.first().and_then(|k| self.profiles.get(k))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Profiles in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.order.iter().filter_map(|k| self.profiles.get(k))
    }

    /// Remove a profile by name; `None` removes the default profile.
    pub fn remove(&mut self, name: Option<&str>) -> Option<Profile> {
        let key = ProfileKey::for_name(name);
        self.order.retain(|k| *k != key);
        self.profiles.remove(&key)
    }

    /// Swap the matching profile's content for `profile`, or append it.
    pub fn replace(&mut self, profile: Profile) {
        let Some(key) = profile.key() else {
            log::warn!("Refusing to replace with a profile without a header");
            return;
        };
        match self.profiles.get_mut(&key) {
            Some(existing) => existing.swap_with(&profile),
            None => {
                self.add(profile);
            }
        }
    }

    /// Update the matching profile from `profile`, or append it.
    pub fn update(&mut self, profile: Profile) {
        let Some(key) = profile.key() else {
            log::warn!("Refusing to update from a profile without a header");
            return;
        };
        match self.profiles.get_mut(&key) {
            Some(existing) => existing.update_with(&profile),
            None => {
                self.add(profile);
            }
        }
    }

    /// Update the profile called `name` from `profile`'s content.
    ///
    /// When `name` is absent a renamed copy of `profile` is appended. Returns
    /// `false` when nothing changed because `name` is not a usable profile
    /// name.
    pub fn update_as(&mut self, name: &str, profile: &Profile) -> bool {
        if let Some(existing) = self.get_mut(name) {
            existing.update_with(profile);
            return true;
        }
        let mut renamed = profile.clone();
        renamed.set_profile_name(Some(name)) && self.add(renamed)
    }
}

/// Collections are equal when they hold equal profiles under the same keys;
/// order and raw text do not matter.
impl PartialEq for ProfileFile {
    fn eq(&self, other: &Self) -> bool {
        self.profiles == other.profiles
    }
}

/// Raw text of every profile in order, separated by blank lines.
impl fmt::Display for ProfileFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .iter()
            .filter_map(Profile::raw_string)
            .collect::<Vec<_>>()
            .join("\n\n");
        f.write_str(&text)
    }
}
