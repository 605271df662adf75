//! One named profile: a header, its recognized members and everything else.
//!
//! The raw lines are the source of truth for what gets written back to disk;
//! comments and unrecognized settings survive in their original order. The
//! header and member map are derived views used for lookups and equality.

use std::collections::BTreeMap;
use std::fmt;

use crate::element::{ProfileElement, ProfileMember};
use crate::header::{Dialect, ProfileHeader, ProfileKey};
use crate::pair::NameValuePair;

/// A single profile section.
#[derive(Debug, Clone)]
pub struct Profile {
    raw_lines: Vec<String>,
    header: Option<ProfileHeader>,
    members: BTreeMap<ProfileElement, ProfileMember>,
    other: Vec<String>,
    dialect: Dialect,
}

impl Profile {
    /// Parse a group of lines into a profile.
    ///
    /// Lines are trimmed and blank lines dropped. The first header line names
    /// the profile; any later header line in the same group is rewritten to
    /// match it.
    pub fn parse<I, S>(lines: I, dialect: Dialect) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw_lines: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        let mut profile = Self {
            raw_lines,
            header: None,
            members: BTreeMap::new(),
            other: Vec::new(),
            dialect,
        };
        profile.reparse(None);
        profile
    }

    /// Parse a profile from a block of text.
    pub fn from_text(text: &str, dialect: Dialect) -> Self {
        Self::parse(text.lines(), dialect)
    }

    /// Re-derive header, members and other lines from `raw_lines`.
    ///
    /// With `identity` set, every header line is rewritten to that header (and
    /// one is inserted if the lines carry none); otherwise the first header
    /// found wins.
    fn reparse(&mut self, identity: Option<ProfileHeader>) {
        self.members.clear();
        self.other.clear();

        let forced = identity.is_some();
        let mut header = identity;
        let mut header_seen = false;

        for line in &mut self.raw_lines {
            if let Some(found) = ProfileHeader::classify(line, self.dialect) {
                if let Some(h) = header.as_ref().filter(|_| forced || header_seen) {
                    if header_seen {
                        log::debug!(
                            "Extra header {:?} in profile group, rewriting to {}",
                            line,
                            h
                        );
                    }
                    *line = h.to_canonical_text();
                } else {
                    header = Some(found);
                }
                header_seen = true;
                continue;
            }

            match ProfileMember::recognize(line) {
                Some(member) if !self.members.contains_key(&member.element()) => {
                    self.members.insert(member.element(), member);
                }
                Some(member) => {
                    log::debug!(
                        "Duplicate {} line in profile, keeping the first one",
                        member.element()
                    );
                    self.other.push(line.clone());
                }
                None => self.other.push(line.clone()),
            }
        }

        if forced
            && !header_seen
            && let Some(h) = &header
        {
            self.raw_lines.insert(0, h.to_canonical_text());
        }

        self.header = header;
    }

    pub fn header(&self) -> Option<&ProfileHeader> {
        self.header.as_ref()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Profile name, or `None` for the default profile (or a headerless group).
    pub fn name(&self) -> Option<&str> {
        self.header.as_ref().and_then(ProfileHeader::profile_name)
    }

    pub fn is_default(&self) -> bool {
        self.header.as_ref().is_some_and(ProfileHeader::is_default)
    }

    /// Identity used by collections; `None` when the lines had no header.
    pub fn key(&self) -> Option<ProfileKey> {
        self.header.as_ref().map(ProfileHeader::key)
    }

    pub fn raw_lines(&self) -> &[String] {
        &self.raw_lines
    }

    /// Lines that are neither the header nor a recognized member.
    pub fn other_lines(&self) -> &[String] {
        &self.other
    }

    pub fn members(&self) -> impl Iterator<Item = &ProfileMember> {
        self.members.values()
    }

    pub fn member(&self, element: ProfileElement) -> Option<&ProfileMember> {
        self.members.get(&element)
    }

    pub fn has_member(&self, element: ProfileElement) -> bool {
        self.members.contains_key(&element)
    }

    pub fn member_value(&self, element: ProfileElement) -> Option<&str> {
        self.member(element).map(ProfileMember::value)
    }

    pub fn key_id(&self) -> Option<&str> {
        self.member_value(ProfileElement::AccessKeyId)
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.member_value(ProfileElement::SecretKey)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.member_value(ProfileElement::SessionToken)
    }

    pub fn region(&self) -> Option<&str> {
        self.member_value(ProfileElement::Region)
    }

    pub fn output(&self) -> Option<&str> {
        self.member_value(ProfileElement::Output)
    }

    /// Value of an unrecognized `name = value` line, matched case-insensitively.
    pub fn other_value(&self, name: &str) -> Option<&str> {
        self.other
            .iter()
            .filter_map(|line| line.split_once('='))
            .find(|(n, _)| n.trim().eq_ignore_ascii_case(name.trim()))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Has a header plus an access key id and secret key.
    pub fn is_valid(&self) -> bool {
        self.header.is_some()
            && self.has_member(ProfileElement::AccessKeyId)
            && self.has_member(ProfileElement::SecretKey)
    }

    /// Valid and also carries a session token.
    pub fn is_valid_and_temporary(&self) -> bool {
        self.is_valid() && self.has_member(ProfileElement::SessionToken)
    }

    /// Set a member's value, adding it if absent.
    ///
    /// The matching raw line is rewritten in place. When there is none, a new
    /// line is synthesized: region and output go directly below the header,
    /// everything else is appended.
    pub fn set_member(&mut self, member: ProfileMember) {
        let element = member.element();
        let line = member.to_line();

        let existing = self.raw_lines.iter_mut().find(|l| {
            NameValuePair::new(l.as_str())
                .name()
                .is_some_and(|n| element.recognizes(n))
        });

        match existing {
            Some(raw) => *raw = line,
            None if element.is_reclaimable() => {
                let at = self
                    .raw_lines
                    .iter()
                    .position(|l| ProfileHeader::is_header(l))
                    .map_or(0, |i| i + 1);
                self.raw_lines.insert(at, line);
            }
            None => self.raw_lines.push(line),
        }

        self.other.retain(|l| {
            !NameValuePair::new(l.as_str())
                .name()
                .is_some_and(|n| element.recognizes(n))
        });
        self.members.insert(element, member);
    }

    /// Rename the profile; `None` or `"default"` turns it into the default profile.
    ///
    /// The first header line is rewritten to the canonical form, or inserted at
    /// the top when the profile has none. Returns `false` and leaves the
    /// profile alone when `name` cannot appear in a header.
    pub fn set_profile_name(&mut self, name: Option<&str>) -> bool {
        self.set_header(ProfileHeader::for_name(name, self.dialect))
    }

    fn set_header(&mut self, header: ProfileHeader) -> bool {
        let text = header.to_canonical_text();
        if !ProfileHeader::is_header(&text) {
            log::error!("Profile name does not form a valid header: {}", text);
            return false;
        }

        match self.raw_lines.iter_mut().find(|l| ProfileHeader::is_header(l)) {
            Some(line) => *line = text,
            None => self.raw_lines.insert(0, text),
        }
        self.header = Some(header);
        true
    }

    /// Take over `other`'s lines but keep this profile's name.
    ///
    /// Region and output present here but missing from `other` are carried
    /// over; credentials are not.
    pub fn update_with(&mut self, other: &Profile) {
        let previous = self.clone();

        self.raw_lines = other.raw_lines.clone();
        self.reparse(previous.header.clone());

        for element in [ProfileElement::Output, ProfileElement::Region] {
            if self.has_member(element) {
                continue;
            }
            if let Some(member) = previous.member(element) {
                log::debug!(
                    "Reclaiming {} = {} for profile {}",
                    element,
                    member.value(),
                    previous.key().map(|k| k.to_string()).unwrap_or_default()
                );
                self.set_member(member.clone());
            }
        }
    }

    /// Become `other` entirely: lines, header and name.
    pub fn swap_with(&mut self, other: &Profile) {
        self.raw_lines = other.raw_lines.clone();
        self.reparse(None);

        if self.key() != other.key()
            && let Some(key) = other.key()
        {
            self.set_header(ProfileHeader::for_key(&key, self.dialect));
        }
    }

    /// The original lines joined with newlines, or `None` when there are none.
    pub fn raw_string(&self) -> Option<String> {
        if self.raw_lines.is_empty() {
            return None;
        }
        Some(self.raw_lines.join("\n").trim().to_string())
    }
}

/// Profiles are equal when their headers and member values match; raw text,
/// comments and unrecognized lines do not count.
impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.members == other.members
    }
}

impl Eq for Profile {}

/// Canonical form: the header line followed by one line per recognized member.
impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(header) = &self.header {
            writeln!(f, "{header}")?;
        }
        for member in self.members.values() {
            writeln!(f, "{} = {}", member.element().field_name(), member.value())?;
        }
        Ok(())
    }
}
