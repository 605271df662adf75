//! Account identity of a set of credentials.
//!
//! [`StsAccountResolver`] calls STS `GetCallerIdentity` with a Signature
//! Version 4 signed POST and reads the account id out of the XML reply.

use anyhow::{Context, Result};
use hmac::digest::{InvalidLength, Output};
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use ureq::Agent;

use credsync_profile::Profile;

/// Region used when a profile does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

const SERVICE: &str = "sts";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";
const GET_CALLER_IDENTITY: &str = "Action=GetCallerIdentity&Version=2011-06-15";

type HmacSha256 = Hmac<Sha256>;

/// Access key pair, optional session token and the region to call STS in.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

impl Credentials {
    /// Credentials of `profile`, or `None` unless it has a key id and secret.
    pub fn from_profile(profile: &Profile, default_region: &str) -> Option<Self> {
        Some(Self {
            access_key_id: profile.key_id()?.to_string(),
            secret_access_key: profile.secret_key()?.to_string(),
            session_token: profile.session_token().map(str::to_string),
            region: profile.region().unwrap_or(default_region).to_string(),
        })
    }

    pub fn is_temporary(&self) -> bool {
        self.session_token.is_some()
    }
}

/// Looks up the account that owns a set of credentials.
pub trait AccountResolver {
    /// `Ok(None)` when the call succeeded but carried no account id.
    fn resolve(&self, credentials: &Credentials) -> Result<Option<String>>;
}

/// Resolves accounts through STS `GetCallerIdentity`.
#[derive(Debug)]
pub struct StsAccountResolver {
    agent: Agent,
}

impl Default for StsAccountResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl StsAccountResolver {
    pub fn new() -> Self {
        Self {
            agent: crate::http::agent(),
        }
    }

    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl AccountResolver for StsAccountResolver {
    fn resolve(&self, credentials: &Credentials) -> Result<Option<String>> {
        let now = chrono::Utc::now();
        let request = SignedRequest::get_caller_identity(
            credentials,
            &now.format("%Y%m%dT%H%M%SZ").to_string(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign STS request: {e}"))?;

        log::debug!(
            "Calling STS GetCallerIdentity at {} for key {}",
            request.url,
            credentials.access_key_id
        );

        let mut call = self
            .agent
            .post(request.url.as_str())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Date", request.amz_date.as_str())
            .header("Authorization", request.authorization.as_str());
        if let Some(token) = &credentials.session_token {
            call = call.header("X-Amz-Security-Token", token.as_str());
        }

        let response = call
            .send(GET_CALLER_IDENTITY)
            .with_context(|| format!("STS request to {} failed", request.url))?;
        let body = response
            .into_body()
            .read_to_string()
            .context("Failed to read STS response")?;

        Ok(parse_account_id(&body))
    }
}

fn account_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<Account>\s*(\d+)\s*</Account>")
            .expect("account_regex: pattern is valid and should always compile")
    })
}

/// Account id from a `GetCallerIdentityResponse` document.
pub fn parse_account_id(body: &str) -> Option<String> {
    account_regex()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A signed `GetCallerIdentity` call.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub url: String,
    pub host: String,
    pub amz_date: String,
    pub canonical_request: String,
    pub string_to_sign: String,
    pub authorization: String,
}

impl SignedRequest {
    /// Sign a `GetCallerIdentity` POST at `amz_date` (`YYYYMMDD'T'HHMMSS'Z'`).
    pub fn get_caller_identity(
        credentials: &Credentials,
        amz_date: &str,
    ) -> Result<Self, InvalidLength> {
        let host = format!("sts.{}.amazonaws.com", credentials.region);
        let date = &amz_date[..amz_date.len().min(8)];

        let mut headers = vec![
            ("content-type", CONTENT_TYPE.to_string()),
            ("host", host.clone()),
            ("x-amz-date", amz_date.to_string()),
        ];
        if let Some(token) = &credentials.session_token {
            headers.push(("x-amz-security-token", token.clone()));
        }

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{}\n", value.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "POST\n/\n\n{canonical_headers}\n{signed_headers}\n{}",
            hex_sha256(GET_CALLER_IDENTITY.as_bytes())
        );

        let scope = format!("{date}/{}/{SERVICE}/aws4_request", credentials.region);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex_sha256(canonical_request.as_bytes())
        );

        let key = signing_key(
            &credentials.secret_access_key,
            date,
            &credentials.region,
            SERVICE,
        )?;
        let signature = format!("{:x}", hmac_sha256(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id
        );

        Ok(Self {
            url: format!("https://{host}/"),
            host,
            amz_date: amz_date.to_string(),
            canonical_request,
            string_to_sign,
            authorization,
        })
    }
}

fn hex_sha256(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Output<HmacSha256>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes())
}

/// SigV4 signing key: `kDate -> kRegion -> kService -> "aws4_request"`.
pub fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Output<HmacSha256>, InvalidLength> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}
