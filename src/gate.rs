use crate::{
    challenge::ChallengeIssuer,
    config::GateConfig,
    digest_verifier::{CredentialStore, DigestVerifier},
    page::site_message,
};
use log::{debug, error, info, warn};
use std::{fmt, fs, io, path::PathBuf};

#[cfg(feature = "from-headers")]
use crate::digest_params::strip_scheme;
#[cfg(feature = "from-headers")]
use http::{
    header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
    HeaderMap, HeaderValue, Request, Response, StatusCode,
};

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const MSG_UNAUTHORIZED: &str = "Wrong username and/or password!";
pub const MSG_NO_CREDENTIALS: &str = "Config error: credentials";
pub const MSG_NO_REALM: &str = "Config error: realm";
pub const MSG_RESOURCE: &str = "Config error: protected resource";

/// Deployment faults. They are reported to the client without detail.
#[derive(Debug)]
pub enum GateError {
    NoCredentials,
    EmptyRealm,
    ResourceUnavailable(io::Error),
    ResourceRejected,
}

impl GateError {
    /// The only text the client gets to see.
    pub fn public_message(&self) -> &'static str {
        match self {
            GateError::NoCredentials => MSG_NO_CREDENTIALS,
            GateError::EmptyRealm => MSG_NO_REALM,
            GateError::ResourceUnavailable(_) | GateError::ResourceRejected => MSG_RESOURCE,
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::NoCredentials => "No credentials configured.".fmt(f),
            GateError::EmptyRealm => "Realm is empty.".fmt(f),
            GateError::ResourceUnavailable(e) => write!(f, "Protected resource unreadable: {}", e),
            GateError::ResourceRejected => "Protected resource failed its content check.".fmt(f),
        }
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GateError::ResourceUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

/// What to send back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub status: u16,
    pub www_authenticate: Option<String>,
    pub content_type: &'static str,
    pub body: String,
}

impl GateResponse {
    fn page(status: u16, message: &str) -> Self {
        Self {
            status,
            www_authenticate: None,
            content_type: CONTENT_TYPE_HTML,
            body: site_message(message),
        }
    }
}

/// Guards a single file with digest authentication.
#[derive(Debug)]
pub struct Gatekeeper {
    credentials: CredentialStore,
    realm: String,
    issuer: ChallengeIssuer,
    resource: PathBuf,
    required_markers: Vec<String>,
}

impl Gatekeeper {
    pub fn new(config: GateConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!("gate configuration is unusable: {}", e);
        }
        let issuer = ChallengeIssuer::new(config.realm.clone(), &config.resource.to_string_lossy());
        Self {
            credentials: config.users,
            realm: config.realm,
            issuer,
            resource: config.resource,
            required_markers: config.required_markers,
        }
    }

    pub fn handle(&self, method: &str, authorization: Option<&str>) -> GateResponse {
        if self.credentials.is_empty() {
            return Self::fault(GateError::NoCredentials);
        }
        if self.realm.is_empty() {
            return Self::fault(GateError::EmptyRealm);
        }

        let verifier = DigestVerifier::new(&self.credentials, &self.realm);
        let identity = match verifier.verify(authorization, method) {
            Ok(identity) => identity,
            Err(reason) => {
                debug!("digest authentication failed: {}", reason);
                return self.unauthorized();
            }
        };
        info!("user {} authenticated", identity.username);

        match self.load_resource() {
            Ok(content) => GateResponse {
                status: 200,
                www_authenticate: None,
                content_type: CONTENT_TYPE_HTML,
                body: content,
            },
            Err(e) => Self::fault(e),
        }
    }

    fn unauthorized(&self) -> GateResponse {
        GateResponse {
            www_authenticate: Some(self.issuer.issue().to_string()),
            ..GateResponse::page(401, MSG_UNAUTHORIZED)
        }
    }

    fn fault(e: GateError) -> GateResponse {
        error!("{}", e);
        GateResponse::page(500, e.public_message())
    }

    fn load_resource(&self) -> Result<String, GateError> {
        let content = fs::read_to_string(&self.resource).map_err(GateError::ResourceUnavailable)?;
        let content = content.trim();
        if content.is_empty()
            || !self
                .required_markers
                .iter()
                .all(|marker| content.contains(marker.as_str()))
        {
            return Err(GateError::ResourceRejected);
        }
        Ok(content.to_owned())
    }

    #[cfg(feature = "from-headers")]
    pub fn respond_to<B>(&self, request: &Request<B>) -> Response<String> {
        self.handle(
            request.method().as_str(),
            authorization_from_headers(request.headers()),
        )
        .into()
    }
}

/// The first `Authorization` value that uses the Digest scheme.
///
/// Values are decoded as UTF-8 so that non-ASCII usernames get through.
#[cfg(feature = "from-headers")]
pub fn authorization_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(AUTHORIZATION)
        .iter()
        .filter_map(|value| std::str::from_utf8(value.as_bytes()).ok())
        .find(|value| strip_scheme(value).is_ok())
}

#[cfg(feature = "from-headers")]
impl From<GateResponse> for Response<String> {
    fn from(gate: GateResponse) -> Self {
        let mut response = Response::new(gate.body);
        *response.status_mut() =
            StatusCode::from_u16(gate.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(gate.content_type));
        if let Some(challenge) = gate.www_authenticate {
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    headers.insert(WWW_AUTHENTICATE, value);
                }
                Err(e) => error!("challenge is not a valid header value: {}", e),
            }
        }
        response
    }
}
