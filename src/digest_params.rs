use std::{collections::HashMap, fmt, str::FromStr};

/// Directives a client must send for `qop=auth`.
pub(crate) const MANDATORY_DIRECTIVES: [&str; 7] =
    ["nonce", "nc", "cnonce", "qop", "username", "uri", "response"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestParseError {
    NotDigest,
    MissingParameter(&'static str),
    MissingRealm,
    MissingNonce,
}

impl DigestParseError {
    fn description(&self) -> &str {
        match self {
            DigestParseError::NotDigest => "Header uses an authentication scheme other than Digest.",
            DigestParseError::MissingParameter(_) => "Digest header lacks a mandatory parameter.",
            DigestParseError::MissingRealm => "Digest scheme must contain a realm value.",
            DigestParseError::MissingNonce => "Digest scheme must contain a nonce value.",
        }
    }
}

impl fmt::Display for DigestParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestParseError::MissingParameter(name) => {
                write!(f, "{} ({})", self.description(), name)
            }
            _ => self.description().fmt(f),
        }
    }
}

impl std::error::Error for DigestParseError {}

/// Strips a leading `Digest` scheme keyword.
///
/// Input without any scheme is returned unchanged. A leading word that is
/// followed by whitespace rather than `=` names some other scheme, in which
/// case there is nothing to parse.
pub(crate) fn strip_scheme(input: &str) -> Result<&str, DigestParseError> {
    let trimmed = input.trim_start();
    let word_len = trimmed
        .find(|c: char| !is_token_char(c))
        .unwrap_or_else(|| trimmed.len());
    let (word, rest) = trimmed.split_at(word_len);
    if word.is_empty() || rest.starts_with('=') {
        return Ok(trimmed);
    }
    if word.eq_ignore_ascii_case("digest") {
        Ok(rest.trim_start())
    } else if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_whitespace()) {
        Err(DigestParseError::NotDigest)
    } else {
        Ok(trimmed)
    }
}

#[inline(always)]
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits a digest header into its `token=value` directives.
///
/// Values may be single-quoted, double-quoted or bare (no comma or
/// whitespace). Anything between directives that doesn't look like one is
/// skipped. When a name repeats, the last value wins.
pub fn parse_directives(input: &str) -> HashMap<String, String> {
    #[derive(PartialEq)]
    enum KeyVal {
        PreKey,
        Key,
    }

    let bytes = input.as_bytes();
    let mut directives = HashMap::new();
    let mut state = KeyVal::PreKey;
    let mut key_start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let ch = bytes[idx] as char;
        match state {
            KeyVal::PreKey => {
                if is_token_char(ch) {
                    key_start = idx;
                    state = KeyVal::Key;
                }
                idx += 1;
            }
            KeyVal::Key => {
                if is_token_char(ch) {
                    idx += 1;
                    continue;
                }
                state = KeyVal::PreKey;
                if ch != '=' {
                    idx += 1;
                    continue;
                }
                match value_at(input, idx + 1) {
                    Some((value, next)) => {
                        directives.insert(input[key_start..idx].to_owned(), value.to_owned());
                        idx = next;
                    }
                    None => idx += 1,
                }
            }
        }
    }

    directives
}

/// Reads the value starting at byte `start`, returning it unquoted along with
/// the index just past it.
fn value_at(input: &str, start: usize) -> Option<(&str, usize)> {
    let rest = &input[start..];
    let quote = rest.chars().next()?;
    if quote == '"' || quote == '\'' {
        if let Some(len) = rest[1..].find(quote) {
            // an empty quoted value falls through to the bare form
            if len > 0 {
                return Some((&rest[1..1 + len], start + len + 2));
            }
        }
    }
    let len = rest
        .find(|c: char| c == ',' || c.is_whitespace())
        .unwrap_or_else(|| rest.len());
    if len == 0 {
        None
    } else {
        Some((&rest[..len], start + len))
    }
}

/// The directives of a client's `Authorization: Digest ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResponseParams {
    pub username: String,
    pub realm: Option<String>,
    pub nonce: String,
    pub uri: String,
    pub qop: String,
    pub nc: String,
    pub cnonce: String,
    pub response: String,
    pub opaque: Option<String>,
}

impl FromStr for DigestResponseParams {
    type Err = DigestParseError;

    fn from_str(auth: &str) -> Result<Self, Self::Err> {
        let mut directives = parse_directives(strip_scheme(auth)?);
        if let Some(missing) = MANDATORY_DIRECTIVES
            .iter()
            .find(|name| !directives.contains_key(**name))
        {
            return Err(DigestParseError::MissingParameter(*missing));
        }
        let realm = directives.remove("realm");
        let opaque = directives.remove("opaque");
        let mut take = |name: &str| directives.remove(name).unwrap_or_default();
        Ok(Self {
            username: take("username"),
            nonce: take("nonce"),
            uri: take("uri"),
            qop: take("qop"),
            nc: take("nc"),
            cnonce: take("cnonce"),
            response: take("response"),
            realm,
            opaque,
        })
    }
}

impl fmt::Display for DigestResponseParams {
    /// Formats as an `Authorization` header value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest username=\"{}\"", self.username)?;
        if let Some(realm) = &self.realm {
            write!(f, ", realm=\"{}\"", realm)?;
        }
        write!(
            f,
            ", nonce=\"{}\", uri=\"{}\", qop={}, nc={}, cnonce=\"{}\", response=\"{}\"",
            self.nonce, self.uri, self.qop, self.nc, self.cnonce, self.response
        )?;
        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque=\"{}\"", opaque)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = r#"Digest username="Mufasa", realm="testrealm@host.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", uri="/dir/index.html", qop=auth, nc=00000001, cnonce="0a4f113b", response="6629fae49393a05397450978507c4ef1", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

    #[test]
    fn parses_mixed_quoting() {
        let params = FIREFOX.parse::<DigestResponseParams>().unwrap();
        assert_eq!(params.username, "Mufasa");
        assert_eq!(params.realm.as_deref(), Some("testrealm@host.com"));
        assert_eq!(params.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(params.uri, "/dir/index.html");
        assert_eq!(params.qop, "auth");
        assert_eq!(params.nc, "00000001");
        assert_eq!(params.cnonce, "0a4f113b");
        assert_eq!(params.response, "6629fae49393a05397450978507c4ef1");
        assert_eq!(
            params.opaque.as_deref(),
            Some("5ccc069c403ebaf9f0171e9517f40e41")
        );
    }

    #[test]
    fn scheme_prefix_is_optional() {
        let bare = FIREFOX.trim_start_matches("Digest ");
        assert_eq!(
            bare.parse::<DigestResponseParams>(),
            FIREFOX.parse::<DigestResponseParams>()
        );
        let lower = FIREFOX.replacen("Digest", "digest", 1);
        assert!(lower.parse::<DigestResponseParams>().is_ok());
    }

    #[test]
    fn other_scheme_is_rejected() {
        assert_eq!(
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==".parse::<DigestResponseParams>(),
            Err(DigestParseError::NotDigest)
        );
    }

    #[test]
    fn single_quotes_and_commas_inside_values() {
        let d = parse_directives(r#"username='Jon, Doe' , uri="/a b,c",nc=00000002"#);
        assert_eq!(d["username"], "Jon, Doe");
        assert_eq!(d["uri"], "/a b,c");
        assert_eq!(d["nc"], "00000002");
    }

    #[test]
    fn last_occurrence_wins() {
        let d = parse_directives(r#"nonce="first", nonce=second"#);
        assert_eq!(d["nonce"], "second");
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn multiline_header() {
        let d = parse_directives(
            "Digest\n   username=\"a\",\n   uri=\"/\",\n   qop=auth",
        );
        assert_eq!(d.len(), 3);
        assert_eq!(d["qop"], "auth");
    }

    #[test]
    fn unterminated_quote_is_kept_as_bare_value() {
        let d = parse_directives(r#"cnonce="abc, nc=1"#);
        assert_eq!(d["cnonce"], "\"abc");
        assert_eq!(d["nc"], "1");
    }

    #[test]
    fn empty_values_are_not_directives() {
        let d = parse_directives("uri= , nc=,qop=auth");
        assert!(!d.contains_key("uri"));
        assert!(!d.contains_key("nc"));
        assert_eq!(d["qop"], "auth");
    }

    #[test]
    fn each_mandatory_directive_is_required() {
        for name in MANDATORY_DIRECTIVES.iter() {
            let header: String = FIREFOX
                .split(", ")
                .filter(|part| !part.trim_start_matches("Digest ").starts_with(&format!("{}=", name)))
                .collect::<Vec<_>>()
                .join(", ");
            let header = if header.starts_with("Digest") {
                header
            } else {
                format!("Digest {}", header)
            };
            assert_eq!(
                header.parse::<DigestResponseParams>(),
                Err(DigestParseError::MissingParameter(*name)),
                "{}",
                header
            );
        }
    }

    #[test]
    fn display_round_trips() {
        let params = FIREFOX.parse::<DigestResponseParams>().unwrap();
        assert_eq!(params.to_string(), FIREFOX);
        assert_eq!(params.to_string().parse::<DigestResponseParams>(), Ok(params));
    }
}
