//! This crate guards a single static resource with HTTP Digest Access Authentication,
//! as specified by IETF RFC2617 with `qop="auth"` and MD5.
//!
//! The server side is split into a [`ChallengeIssuer`] producing `WWW-Authenticate`
//! values and a [`DigestVerifier`] checking `Authorization` values against a
//! [`CredentialStore`]. [`Gatekeeper`] wires both to a file on disk.
//!
//! ```
//! use digest_gate::{ChallengeIssuer, CredentialStore, DigestClient, DigestVerifier};
//!
//! let realm = "Please enter your username and password";
//! let mut users = CredentialStore::new();
//! users.insert("alice", "secret");
//!
//! let issuer = ChallengeIssuer::new(realm, "/genpw.html");
//! let challenge = issuer.issue();
//!
//! let authorization = DigestClient::new("alice", "secret")
//!     .respond(&challenge, "GET", "/genpw.html", None)
//!     .to_string();
//!
//! let verifier = DigestVerifier::new(&users, realm);
//! let identity = verifier.verify(Some(authorization.as_str()), "GET").unwrap();
//! assert_eq!(identity.username, "alice");
//! ```
//!
//! Nonces are not remembered between requests, so a captured response can be
//! replayed for as long as the client keeps its nonce.

mod challenge;
mod client;
pub mod config;
mod digest_params;
mod digest_verifier;
mod gate;
pub mod page;

pub use challenge::{ChallengeIssuer, DigestChallenge, QOP_AUTH};
pub use client::DigestClient;
pub use config::{ConfigError, GateConfig};
pub use digest_params::{parse_directives, DigestParseError, DigestResponseParams};
pub use digest_verifier::{
    calculate_ha2, calculate_response, expected_response, hash_user_realm_password,
    AuthFailure, Authenticated, CredentialStore, DigestVerifier,
};
#[cfg(feature = "from-headers")]
pub use gate::authorization_from_headers;
pub use gate::{GateError, GateResponse, Gatekeeper};

#[cfg(test)]
mod tests {
    use crate::{
        AuthFailure, CredentialStore, DigestResponseParams, DigestVerifier, expected_response,
    };
    use digest::Digest;
    use md5::Md5;

    const REALM: &str = "Please enter your username and password";

    fn md5_hex(s: &str) -> String {
        hex::encode(Md5::digest(s.as_bytes()))
    }

    #[test]
    fn rfc2617() {
        let header = r#"Digest username="Mufasa", realm="testrealm@host.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", uri="/dir/index.html", qop=auth, nc=00000001, cnonce="0a4f113b", response="6629fae49393a05397450978507c4ef1", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;
        let mut users = CredentialStore::new();
        users.insert("Mufasa", "Circle Of Life");
        let verifier = DigestVerifier::new(&users, "testrealm@host.com");
        assert_eq!(
            verifier.verify(Some(header), "GET").unwrap().username,
            "Mufasa"
        );
        assert_eq!(
            verifier.verify(Some(header), "POST"),
            Err(AuthFailure::DigestMismatch)
        );
    }

    #[test]
    fn genpw_scenario() {
        let ha1 = md5_hex(&format!("alice:{}:secret", REALM));
        let ha2 = md5_hex("GET:/genpw.html");
        let expected = md5_hex(&format!("{}:abc123:00000001:xyz:auth:{}", ha1, ha2));

        let header = |response: &str| {
            format!(
                r#"Digest username="alice", realm="{}", nonce="abc123", uri="/genpw.html", qop=auth, nc=00000001, cnonce="xyz", response="{}""#,
                REALM, response
            )
        };
        let params = header(expected.as_str()).parse::<DigestResponseParams>().unwrap();
        assert_eq!(expected_response(REALM, "secret", "GET", &params), expected);

        let users: CredentialStore = vec![("alice", "secret")].into_iter().collect();
        let verifier = DigestVerifier::new(&users, REALM);
        assert_eq!(
            verifier.verify(Some(header(expected.as_str()).as_str()), "GET").unwrap().username,
            "alice"
        );
        assert_eq!(
            verifier.verify(Some(header("0123456789abcdef0123456789abcdef").as_str()), "GET"),
            Err(AuthFailure::DigestMismatch)
        );
    }

    #[test]
    fn realm_must_match_exactly() {
        let users: CredentialStore = vec![("alice", "secret")].into_iter().collect();
        let mut client = crate::DigestClient::new("alice", "secret");
        let challenge = crate::ChallengeIssuer::new(REALM, "/genpw.html").issue();
        let auth = client.respond(&challenge, "GET", "/genpw.html", None).to_string();

        let verifier = DigestVerifier::new(&users, "Please enter your username and password ");
        assert_eq!(
            verifier.verify(Some(auth.as_str()), "GET"),
            Err(AuthFailure::DigestMismatch)
        );
    }
}
