//! Named-profile credentials and config files.
//!
//! Parsing is lossless: comments and unknown settings are kept in each
//! profile's raw lines and written back untouched, while lookups and equality
//! work on the recognized settings only.

pub mod element;
pub mod error;
pub mod file;
pub mod header;
pub mod mapper;
pub mod modifier;
pub mod pair;
pub mod profile;

pub use element::{ProfileElement, ProfileMember};
pub use error::ProfileError;
pub use file::ProfileFile;
pub use header::{DEFAULT_PROFILE, Dialect, ProfileHeader, ProfileKey};
pub use mapper::ProfileNameMapper;
pub use modifier::{CredentialsModifier, MergeOutcome};
pub use pair::NameValuePair;
pub use profile::Profile;
