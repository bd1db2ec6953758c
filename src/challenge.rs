use crate::digest_params::{parse_directives, strip_scheme, DigestParseError};
use digest::Digest;
use md5::Md5;
use rand::{thread_rng, Rng};
use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

pub const QOP_AUTH: &str = "auth";

/// A `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub qop: String,
    pub nonce: String,
    pub opaque: Option<String>,
}

impl fmt::Display for DigestChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Digest realm=\"{}\", qop=\"{}\", nonce=\"{}\"",
            self.realm, self.qop, self.nonce
        )?;
        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque=\"{}\"", opaque)?;
        }
        Ok(())
    }
}

impl FromStr for DigestChallenge {
    type Err = DigestParseError;

    fn from_str(www_auth: &str) -> Result<Self, Self::Err> {
        let mut directives = parse_directives(strip_scheme(www_auth)?);
        let realm = directives
            .remove("realm")
            .ok_or(DigestParseError::MissingRealm)?;
        let nonce = directives
            .remove("nonce")
            .ok_or(DigestParseError::MissingNonce)?;
        Ok(Self {
            realm,
            qop: directives
                .remove("qop")
                .unwrap_or_else(|| QOP_AUTH.to_owned()),
            nonce,
            opaque: directives.remove("opaque"),
        })
    }
}

/// Issues challenges for one protected resource.
///
/// The opaque value is fixed at construction so that all challenges for the
/// resource share it; every call to [`ChallengeIssuer::issue`] draws a new
/// nonce.
#[derive(Debug, Clone)]
pub struct ChallengeIssuer {
    realm: String,
    opaque: String,
}

impl ChallengeIssuer {
    pub fn new<R: Into<String>>(realm: R, resource_id: &str) -> Self {
        let realm = realm.into();
        let mut hasher = Md5::new();
        hasher.update(&realm);
        hasher.update(resource_id);
        let opaque = hex::encode(hasher.finalize());
        Self { realm, opaque }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    pub fn issue(&self) -> DigestChallenge {
        DigestChallenge {
            realm: self.realm.clone(),
            qop: QOP_AUTH.to_owned(),
            nonce: Self::nonce(),
            opaque: Some(self.opaque.clone()),
        }
    }

    /// 128 random bits followed by the current time in microseconds, both hex.
    pub fn nonce() -> String {
        let random: [u8; 16] = thread_rng().gen();
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or_default();
        format!("{}{:x}", hex::encode(random), micros)
    }
}
