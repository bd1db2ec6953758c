use crate::digest_params::{DigestParseError, DigestResponseParams};
use digest::{Digest, Output};
use md5::Md5;
use serde::Deserialize;
use std::{collections::HashMap, fmt, iter::FromIterator};

/// Username to plaintext password map consulted when recomputing digests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the password for `username`.
    pub fn insert<U: Into<String>, P: Into<String>>(&mut self, username: U, password: P) {
        self.users.insert(username.into(), password.into());
    }

    pub fn password(&self, username: &str) -> Option<&str> {
        self.users.get(username).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

impl<U: Into<String>, P: Into<String>> FromIterator<(U, P)> for CredentialStore {
    fn from_iter<I: IntoIterator<Item = (U, P)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (username, password) in iter {
            store.insert(username, password);
        }
        store
    }
}

/// Why a request was not authenticated. Never shown to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredentials,
    MalformedCredentials(DigestParseError),
    UnknownUser,
    DigestMismatch,
}

impl AuthFailure {
    fn description(&self) -> &str {
        match self {
            AuthFailure::MissingCredentials => "No digest credentials supplied.",
            AuthFailure::MalformedCredentials(_) => "Digest credentials could not be parsed.",
            AuthFailure::UnknownUser => "Claimed username is not configured.",
            AuthFailure::DigestMismatch => "Digest response does not match.",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::MalformedCredentials(e) => write!(f, "{} {}", self.description(), e),
            _ => self.description().fmt(f),
        }
    }
}

impl std::error::Error for AuthFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthFailure::MalformedCredentials(e) => Some(e),
            _ => None,
        }
    }
}

/// The verified identity of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub username: String,
}

/// `H(username:realm:password)`, the binary form of HA1.
pub fn hash_user_realm_password<T: Digest>(
    username: &str,
    realm: &str,
    password: &str,
) -> Output<T> {
    let mut hasher = T::new();
    hasher.update(username);
    hasher.update(":");
    hasher.update(realm);
    hasher.update(":");
    hasher.update(password);
    hasher.finalize()
}

pub fn calculate_ha2<T: Digest>(method: &str, uri: &str) -> String {
    let mut hasher = T::new();
    hasher.update(method);
    hasher.update(":");
    hasher.update(uri);
    hex::encode(hasher.finalize())
}

pub fn calculate_response<T: Digest>(ha1: &str, params: &DigestResponseParams, ha2: &str) -> String {
    let mut hasher = T::new();
    hasher.update(ha1);
    hasher.update(":");
    hasher.update(&params.nonce);
    hasher.update(":");
    hasher.update(&params.nc);
    hasher.update(":");
    hasher.update(&params.cnonce);
    hasher.update(":");
    hasher.update(&params.qop);
    hasher.update(":");
    hasher.update(ha2);
    hex::encode(hasher.finalize())
}

/// The lowercase hex MD5 response a client knowing `password` must send.
///
/// `uri` is taken from `params` as sent; it is not compared to the request
/// target.
pub fn expected_response(
    realm: &str,
    password: &str,
    method: &str,
    params: &DigestResponseParams,
) -> String {
    let ha1 = hex::encode(hash_user_realm_password::<Md5>(
        &params.username,
        realm,
        password,
    ));
    let ha2 = calculate_ha2::<Md5>(method, &params.uri);
    calculate_response::<Md5>(&ha1, params, &ha2)
}

/// Checks one request's `Authorization` header against the credential store.
#[derive(Debug, Clone, Copy)]
pub struct DigestVerifier<'a> {
    credentials: &'a CredentialStore,
    realm: &'a str,
}

impl<'a> DigestVerifier<'a> {
    pub fn new(credentials: &'a CredentialStore, realm: &'a str) -> Self {
        Self { credentials, realm }
    }

    /// Decide whether the request is authenticated.
    ///
    /// The `Err` variants only explain the decision for diagnostics; every one
    /// of them must produce the same 401 for the client.
    pub fn verify(
        &self,
        authorization: Option<&str>,
        method: &str,
    ) -> Result<Authenticated, AuthFailure> {
        let authorization = match authorization.map(str::trim) {
            Some(a) if !a.is_empty() => a,
            _ => return Err(AuthFailure::MissingCredentials),
        };
        let params = authorization
            .parse::<DigestResponseParams>()
            .map_err(AuthFailure::MalformedCredentials)?;

        // Still hash for unknown users so both paths do the same work; the
        // result is never compared.
        let (password, known) = match self.credentials.password(&params.username) {
            Some(p) => (p, true),
            None => ("", false),
        };
        let expected = expected_response(self.realm, password, method, &params);
        if !known {
            return Err(AuthFailure::UnknownUser);
        }
        // TODO: switch to a constant-time comparison to close the timing side channel.
        if params.response != expected {
            return Err(AuthFailure::DigestMismatch);
        }
        Ok(Authenticated {
            username: params.username,
        })
    }
}
