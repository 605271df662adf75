//! HTTP client helper with native-tls support.
//!
//! Uses the system TLS library (Schannel on Windows, OpenSSL on Linux,
//! Security.framework on macOS) and the platform's root certificates.

use std::time::Duration;

use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// Overall timeout for a single STS call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a new HTTP agent configured with native-tls.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build()
        .into()
}
