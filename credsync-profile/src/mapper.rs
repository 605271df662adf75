//! Account id to profile name lookup, read from a properties-style file.
//!
//! ```text
//! # account = profile
//! 123456789012 = prod
//! 210987654321: sandbox
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ProfileError, Result};
use crate::pair::NameValuePair;

#[derive(Debug, Clone, Default)]
pub struct ProfileNameMapper {
    entries: HashMap<String, String>,
}

impl ProfileNameMapper {
    /// Parse `key=value` or `key: value` lines. `#` and `!` start comments,
    /// blank lines are skipped and a later key overrides an earlier one.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some(delimiter) = line.find(['=', ':']).map(|i| &line[i..i + 1]) else {
                log::debug!("Ignoring mapping line without a delimiter: {:?}", line);
                continue;
            };

            let pair = NameValuePair::with_delimiter(line, delimiter);
            match (pair.name(), pair.value()) {
                (Some(account), Some(profile)) => {
                    if let Some(previous) = entries.insert(account.to_string(), profile.to_string())
                    {
                        log::debug!(
                            "Account {} mapped again, {} replaces {}",
                            account,
                            profile,
                            previous
                        );
                    }
                }
                _ => log::debug!("Ignoring incomplete mapping line: {:?}", line),
            }
        }

        Self { entries }
    }

    /// Read a mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Mapping {
            path: path.to_path_buf(),
            source,
        })?;
        let mapper = Self::parse(&text);
        log::info!(
            "Loaded {} account mappings from {}",
            mapper.len(),
            path.display()
        );
        Ok(mapper)
    }

    /// Profile name for `account_id`, if mapped.
    pub fn profile_name(&self, account_id: &str) -> Option<&str> {
        self.entries.get(account_id.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
