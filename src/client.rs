use crate::{
    challenge::{DigestChallenge, QOP_AUTH},
    digest_params::DigestResponseParams,
    digest_verifier::expected_response,
};
use rand::{
    distributions::{Distribution, Uniform},
    seq::SliceRandom,
    thread_rng,
};

/// Answers `qop=auth` challenges on behalf of one user.
///
/// The nonce count advances with every response, so one client can reuse a
/// challenge for several requests.
#[derive(Debug)]
pub struct DigestClient {
    username: String,
    password: String,
    nonce_count: u32,
}

impl DigestClient {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            nonce_count: 0,
        }
    }

    /// Build the `Authorization` directives for a request.
    ///
    /// A random cnonce is generated when `cnonce` is `None`.
    pub fn respond(
        &mut self,
        challenge: &DigestChallenge,
        method: &str,
        uri: &str,
        cnonce: Option<&str>,
    ) -> DigestResponseParams {
        self.nonce_count += 1;
        let mut params = DigestResponseParams {
            username: self.username.clone(),
            realm: Some(challenge.realm.clone()),
            nonce: challenge.nonce.clone(),
            uri: uri.to_owned(),
            qop: QOP_AUTH.to_owned(),
            nc: format!("{:08x}", self.nonce_count),
            cnonce: match cnonce {
                Some(c) => c.to_owned(),
                None => Self::cnonce(),
            },
            response: String::new(),
            opaque: challenge.opaque.clone(),
        };
        params.response = expected_response(&challenge.realm, &self.password, method, &params);
        params
    }

    pub fn cnonce() -> String {
        const HEX_CHARS: [char; 16] = [
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let mut rng = thread_rng();
        let size = Uniform::new_inclusive(8, 32).sample(&mut rng);
        (0..size)
            .filter_map(|_| HEX_CHARS.choose(&mut rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc2617_challenge() -> DigestChallenge {
        r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#
            .parse()
            .unwrap()
    }

    #[test]
    fn rfc2617_vector() {
        let mut client = DigestClient::new("Mufasa", "Circle Of Life");
        let params = client.respond(&rfc2617_challenge(), "GET", "/dir/index.html", Some("0a4f113b"));
        assert_eq!(params.response, "6629fae49393a05397450978507c4ef1");
        assert_eq!(
            params.to_string(),
            r#"Digest username="Mufasa", realm="testrealm@host.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", uri="/dir/index.html", qop=auth, nc=00000001, cnonce="0a4f113b", response="6629fae49393a05397450978507c4ef1", opaque="5ccc069c403ebaf9f0171e9517f40e41""#
        );
    }

    #[test]
    fn nonce_count_advances() {
        let mut client = DigestClient::new("Mufasa", "Circle Of Life");
        let challenge = rfc2617_challenge();
        let first = client.respond(&challenge, "GET", "/dir/index.html", Some("0a4f113b"));
        let second = client.respond(&challenge, "GET", "/dir/index.html", Some("0a4f113b"));
        assert_eq!(first.nc, "00000001");
        assert_eq!(second.nc, "00000002");
        assert_ne!(first.response, second.response);
    }

    #[test]
    fn generated_cnonce_is_hex() {
        for _ in 0..100 {
            let c = DigestClient::cnonce();
            assert!(c.len() >= 8 && c.len() <= 32);
            assert!(c.chars().all(|ch| ch.is_ascii_hexdigit()));
        }
    }
}
