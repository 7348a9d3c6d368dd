//! Inbound API-key check for plancoach
//!
//! Keys are held only as BLAKE3 digests. A candidate is hashed once and
//! compared against every configured digest with `blake3::Hash`'s
//! constant-time equality; the scan never stops early.

use std::fmt;

use tracing::debug;

/// Where an accepted key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// `X-API-Key` header.
    Header,
    /// `api_key` query parameter.
    Query,
}

impl KeySource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No key was supplied.
    Missing,
    /// A key was supplied but matched nothing.
    Invalid,
}

/// Outcome of [`AccessGate::authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized {
        source: KeySource,
        /// First 8 hex chars of the key digest. Safe to log.
        fingerprint: String,
    },
    Unauthorized(Rejection),
}

impl AuthDecision {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}

/// Set of accepted inbound keys.
#[derive(Clone)]
pub struct AccessGate {
    digests: Vec<blake3::Hash>,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("keys", &self.digests.len())
            .finish()
    }
}

impl AccessGate {
    /// Build a gate from plaintext keys. Blank keys are ignored.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let digests = keys
            .into_iter()
            .filter(|k| !k.as_ref().trim().is_empty())
            .map(|k| blake3::hash(k.as_ref().as_bytes()))
            .collect();
        Self { digests }
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.digests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Check the header key, then the query key.
    ///
    /// Keys must match exactly: no trimming and no case folding. Empty
    /// candidates count as absent.
    #[must_use]
    pub fn authorize(&self, header_key: Option<&str>, query_key: Option<&str>) -> AuthDecision {
        let candidates = [(KeySource::Header, header_key), (KeySource::Query, query_key)];
        let mut supplied = false;

        for (source, candidate) in candidates {
            let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
                continue;
            };
            supplied = true;

            let digest = blake3::hash(candidate.as_bytes());
            if self.matches(&digest) {
                let fingerprint = fingerprint(&digest);
                debug!(source = %source, key = %fingerprint, "request authorized");
                return AuthDecision::Authorized {
                    source,
                    fingerprint,
                };
            }
        }

        let rejection = if supplied {
            Rejection::Invalid
        } else {
            Rejection::Missing
        };
        debug!(?rejection, "request rejected");
        AuthDecision::Unauthorized(rejection)
    }

    fn matches(&self, digest: &blake3::Hash) -> bool {
        self.digests
            .iter()
            .fold(false, |found, known| found | (known == digest))
    }
}

fn fingerprint(digest: &blake3::Hash) -> String {
    digest.to_hex().as_str()[..8].to_string()
}
