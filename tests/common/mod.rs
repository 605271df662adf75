//! Shared integration test helpers for credsync.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{TARGET_THREE_PROFILES, write_file};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers are used per file.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use credsync::identity::{AccountResolver, Credentials};
use parking_lot::Mutex;

/// Target with three complete profiles, the middle one carrying region/output.
pub const TARGET_THREE_PROFILES: &str = "[myprofile1]
aws_access_key_id = ASIAMYPROFILE1ID
aws_secret_access_key = myprofile1secret
aws_session_token = myprofile1token

[myprofile2]
region = us-east-1
output = json
aws_access_key_id = ASIAMYPROFILE2ID
aws_secret_access_key = myprofile2secret
aws_session_token = myprofile2token

[myprofile3]
aws_access_key_id = ASIAMYPROFILE3ID
aws_secret_access_key = myprofile3secret
aws_session_token = myprofile3token
";

/// Source holding a fresh copy of `myprofile2` only.
pub const SOURCE_MYPROFILE2: &str = "[myprofile2]
aws_access_key_id = ASIANEWPROFILE2ID
aws_secret_access_key = newprofile2secret
aws_session_token = newprofile2token
";

/// Source holding nothing but a default profile.
pub const SOURCE_DEFAULT_ONLY: &str = "[default]
aws_access_key_id = ASIADEFAULTID
aws_secret_access_key = defaultsecret
aws_session_token = defaulttoken
";

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

pub fn read_file(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}

/// Resolver returning a canned answer and recording what it was asked.
#[derive(Default)]
pub struct StubResolver {
    pub account_id: Option<String>,
    pub fail: bool,
    pub seen: Mutex<Vec<Credentials>>,
}

impl StubResolver {
    pub fn returning(account_id: &str) -> Self {
        Self {
            account_id: Some(account_id.to_string()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl AccountResolver for StubResolver {
    fn resolve(&self, credentials: &Credentials) -> anyhow::Result<Option<String>> {
        self.seen.lock().push(credentials.clone());
        if self.fail {
            anyhow::bail!("stubbed STS failure");
        }
        Ok(self.account_id.clone())
    }
}

/// Wait until `rx` yields a value or the timeout passes.
pub fn wait_for<T>(rx: &Receiver<T>, secs: u64) -> Option<T> {
    rx.recv_timeout(Duration::from_secs(secs)).ok()
}
