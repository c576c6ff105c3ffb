//! Google Calendar API v3: free/busy queries.
//!
//! One blocking `POST /freeBusy` per request. Authentication is either a
//! service-account key exchanged for an access token through the JWT-bearer
//! grant (optionally impersonating a Workspace user via domain-wide
//! delegation), or a bearer token supplied by the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::source::{AvailabilitySource, BusyByCalendar, SourceError};

pub const FREEBUSY_URL: &str = "https://www.googleapis.com/calendar/v3/freeBusy";
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

// ============================================================================
// Credentials
// ============================================================================

/// The fields of a service-account key file this client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    /// Load a key file downloaded from the Google Cloud console.
    ///
    /// # Errors
    /// `SourceError::CredentialsNotFound` if the file is missing,
    /// `SourceError::InvalidCredentials` if it is not a usable key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SourceError::CredentialsNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| SourceError::InvalidCredentials(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| SourceError::InvalidCredentials(e.to_string()))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(SourceError::InvalidCredentials(
                "client_email and private_key are required".to_string(),
            ));
        }
        // Reject a bad PEM now rather than at the first request.
        EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SourceError::InvalidCredentials(format!("private_key: {e}")))?;
        Ok(key)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &REDACTED)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

const REDACTED: &str = "<redacted>";

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// How requests are authorized.
#[derive(Clone)]
pub enum Credentials {
    ServiceAccount {
        key: ServiceAccountKey,
        /// User to impersonate (domain-wide delegation).
        subject: Option<String>,
    },
    AccessToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ServiceAccount { key, subject } => f
                .debug_struct("ServiceAccount")
                .field("key", key)
                .field("subject", subject)
                .finish(),
            Credentials::AccessToken(_) => f.debug_tuple("AccessToken").field(&REDACTED).finish(),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<&'a str>,
    items: Vec<FreeBusyItem<'a>>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItem<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: BTreeMap<String, CalendarBusy>,
}

#[derive(Debug, Deserialize)]
struct CalendarBusy {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
    #[serde(default)]
    errors: Vec<CalendarErrorRaw>,
}

#[derive(Debug, Deserialize)]
struct BusyPeriod {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct CalendarErrorRaw {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    reason: String,
}

// ============================================================================
// Client
// ============================================================================

/// Free/busy source backed by the Google Calendar API.
#[derive(Debug, Clone)]
pub struct GoogleFreeBusy {
    client: Client,
    credentials: Credentials,
    endpoint: String,
    time_zone: Option<String>,
}

impl GoogleFreeBusy {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            endpoint: FREEBUSY_URL.to_string(),
            time_zone: None,
        }
    }

    /// Load a service-account key file, optionally impersonating `subject`.
    pub fn from_service_account_file(
        path: impl AsRef<Path>,
        subject: Option<String>,
    ) -> Result<Self, SourceError> {
        let key = ServiceAccountKey::from_file(path)?;
        Ok(Self::new(Credentials::ServiceAccount { key, subject }))
    }

    /// IANA zone Google uses when formatting the response.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn access_token(&self) -> Result<String, SourceError> {
        match &self.credentials {
            Credentials::AccessToken(token) => Ok(token.clone()),
            Credentials::ServiceAccount { key, subject } => {
                let assertion = sign_assertion(key, subject.as_deref(), Utc::now())?;
                let resp = self
                    .client
                    .post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                    .send()?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().unwrap_or_default();
                    return Err(token_error_for_status(status, &body));
                }
                let token: TokenResponse = resp.json()?;
                tracing::debug!(account = %key.client_email, "obtained access token");
                Ok(token.access_token)
            }
        }
    }
}

impl AvailabilitySource for GoogleFreeBusy {
    fn fetch_busy(
        &self,
        range: &Interval,
        calendar_ids: &[String],
    ) -> Result<BusyByCalendar, SourceError> {
        let token = self.access_token()?;
        let request = FreeBusyRequest {
            time_min: format_timestamp(range.start()),
            time_max: format_timestamp(range.end()),
            time_zone: self.time_zone.as_deref(),
            items: calendar_ids
                .iter()
                .map(|id| FreeBusyItem { id: id.as_str() })
                .collect(),
        };
        tracing::debug!(
            time_min = %request.time_min,
            time_max = %request.time_max,
            calendars = calendar_ids.len(),
            "freeBusy query"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if let Some(err) = error_for_status(status, &body) {
            return Err(err);
        }
        parse_freebusy_response(&body, calendar_ids)
    }
}

fn sign_assertion(
    key: &ServiceAccountKey,
    subject: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, SourceError> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: CALENDAR_READONLY_SCOPE,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        sub: subject,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SourceError::InvalidCredentials(format!("private_key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| SourceError::InvalidCredentials(format!("signing assertion: {e}")))
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Map a non-success HTTP status to a source error.
fn error_for_status(status: StatusCode, body: &str) -> Option<SourceError> {
    if status.is_success() {
        return None;
    }
    let message = body.to_string();
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited(message),
        _ => SourceError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// Map a failed token exchange. The token endpoint answers a rejected
/// assertion (`invalid_grant`, unknown subject) with 400; quota and outage
/// statuses keep their usual meaning.
fn token_error_for_status(status: StatusCode, body: &str) -> SourceError {
    match status {
        StatusCode::BAD_REQUEST => SourceError::Auth(format!("token exchange rejected: {body}")),
        _ => error_for_status(status, body).unwrap_or_else(|| SourceError::Api {
            status: status.as_u16(),
            message: body.to_string(),
        }),
    }
}

/// Turn a freeBusy response body into busy intervals per requested calendar.
///
/// A calendar the API reports an error for (e.g. `notFound`) fails the whole
/// query. Zero-length busy periods carry no busy time and are dropped.
fn parse_freebusy_response(
    body: &str,
    calendar_ids: &[String],
) -> Result<BusyByCalendar, SourceError> {
    let mut resp: FreeBusyResponse =
        serde_json::from_str(body).map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

    let mut out = BusyByCalendar::new();
    for id in calendar_ids {
        let Some(calendar) = resp.calendars.remove(id) else {
            out.insert(id.clone(), Vec::new());
            continue;
        };
        if let Some(err) = calendar.errors.first() {
            return Err(SourceError::Calendar {
                id: id.clone(),
                reason: format!("{}/{}", err.domain, err.reason),
            });
        }

        let mut busy = Vec::with_capacity(calendar.busy.len());
        for period in calendar.busy {
            let start = parse_timestamp(&period.start)?;
            let end = parse_timestamp(&period.end)?;
            if start < end {
                busy.push(Interval::new_unchecked(start, end));
            }
        }
        tracing::debug!(calendar = %id, busy = busy.len(), "busy periods");
        out.insert(id.clone(), busy);
    }
    Ok(out)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SourceError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SourceError::InvalidResponse(format!("timestamp '{s}': {e}")))
}
