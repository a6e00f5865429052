use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::providers::PROVIDER_ID;

// ============ DNS Record Types ============

/// Service parameters of an HTTPS/SVCB record (`alpn=h3,h2 port=443`).
///
/// Keys are kept sorted so the textual form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvcParams(pub BTreeMap<String, Vec<String>>);

impl SvcParams {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SvcParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, values) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            first = false;

            if values.is_empty() {
                f.write_str(key)?;
                continue;
            }
            let joined = values.join(",");
            if joined.chars().any(char::is_whitespace) {
                write!(f, "{key}=\"{joined}\"")?;
            } else {
                write!(f, "{key}={joined}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for SvcParams {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut params = BTreeMap::new();
        for token in split_quoted(s)? {
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (token.as_str(), None),
            };
            if key.is_empty() {
                return Err(format!("empty key in service parameter '{token}'"));
            }
            let values = match value.map(|v| v.trim_matches('"')) {
                Some(v) if !v.is_empty() => v.split(',').map(str::to_string).collect(),
                _ => Vec::new(),
            };
            params.insert(key.to_ascii_lowercase(), values);
        }
        Ok(Self(params))
    }
}

/// 按空白切分，双引号内的空白不切分
fn split_quoted(s: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(format!("unterminated quote in service parameters '{s}'"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Type-safe representation of DNS record data.
///
/// Each variant carries the fields specific to that record type. Every
/// variant renders to the presentation-format data of a [`Rr`] and parses
/// back from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum RecordData {
    /// A record: maps a hostname to an IPv4 address.
    A {
        /// IPv4 address (e.g., `"192.0.2.1"`).
        address: String,
    },

    /// AAAA record: maps a hostname to an IPv6 address.
    AAAA {
        /// IPv6 address (e.g., `"2001:db8::1"`).
        address: String,
    },

    /// CNAME record: alias from one name to another.
    CNAME {
        /// Target hostname.
        target: String,
    },

    /// NS record: authoritative name server.
    NS {
        /// Name server hostname.
        nameserver: String,
    },

    /// TXT record: arbitrary text data.
    TXT {
        /// Text content.
        text: String,
    },

    /// MX record: mail exchange server.
    MX {
        /// Preference (lower = preferred).
        preference: u16,
        /// Mail server hostname.
        exchange: String,
    },

    /// SRV record: service locator. The owner name is
    /// `_service._transport.name`.
    SRV {
        /// Service label without the leading underscore (e.g. `"sip"`).
        service: String,
        /// Transport label without the leading underscore (e.g. `"tcp"`).
        transport: String,
        /// Priority (lower = preferred).
        priority: u16,
        /// Weight for load balancing among same-priority targets.
        weight: u16,
        /// TCP/UDP port number.
        port: u16,
        /// Target hostname providing the service.
        target: String,
    },

    /// CAA record: Certificate Authority Authorization.
    CAA {
        /// Issuer critical flag (0 or 128).
        flags: u8,
        /// Property tag (`"issue"`, `"issuewild"`, or `"iodef"`).
        tag: String,
        /// CA domain or reporting URI.
        value: String,
    },

    /// HTTPS service binding.
    HTTPS {
        /// Priority; 0 means alias mode.
        priority: u16,
        /// Target name, `"."` for the owner itself.
        target: String,
        /// Service parameters.
        params: SvcParams,
    },

    /// Generic SVCB service binding.
    SVCB {
        /// Priority; 0 means alias mode.
        priority: u16,
        /// Target name, `"."` for the owner itself.
        target: String,
        /// Service parameters.
        params: SvcParams,
    },

    /// Any other record type, kept as opaque presentation data.
    Other {
        /// Uppercase record type (e.g. `"TLSA"`).
        record_type: String,
        /// Presentation-format data.
        data: String,
    },
}

impl RecordData {
    /// Returns the record type tag (`"A"`, `"MX"`, ...).
    pub fn record_type(&self) -> &str {
        match self {
            Self::A { .. } => "A",
            Self::AAAA { .. } => "AAAA",
            Self::CNAME { .. } => "CNAME",
            Self::NS { .. } => "NS",
            Self::TXT { .. } => "TXT",
            Self::MX { .. } => "MX",
            Self::SRV { .. } => "SRV",
            Self::CAA { .. } => "CAA",
            Self::HTTPS { .. } => "HTTPS",
            Self::SVCB { .. } => "SVCB",
            Self::Other { record_type, .. } => record_type,
        }
    }

    /// Presentation-format data, as it appears after the type in a zone file.
    pub fn presentation(&self) -> String {
        match self {
            Self::A { address } | Self::AAAA { address } => address.clone(),
            Self::CNAME { target } => target.clone(),
            Self::NS { nameserver } => nameserver.clone(),
            Self::TXT { text } => text.clone(),
            Self::MX {
                preference,
                exchange,
            } => format!("{preference} {exchange}"),
            Self::SRV {
                priority,
                weight,
                port,
                target,
                ..
            } => format!("{priority} {weight} {port} {target}"),
            Self::CAA { flags, tag, value } => format!("{flags} {tag} \"{value}\""),
            Self::HTTPS {
                priority,
                target,
                params,
            }
            | Self::SVCB {
                priority,
                target,
                params,
            } => {
                if params.is_empty() {
                    format!("{priority} {target}")
                } else {
                    format!("{priority} {target} {params}")
                }
            }
            Self::Other { data, .. } => data.clone(),
        }
    }
}

/// The canonical `(name, type, data, ttl)` projection of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rr {
    /// Zone-relative owner name (`"@"` for the apex).
    pub name: String,
    /// Time to live.
    #[serde(with = "crate::utils::ttl")]
    pub ttl: Duration,
    /// Uppercase record type.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Presentation-format data.
    pub data: String,
}

/// A DNS record as exchanged with the calling host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Remote record id; `None` until the record exists remotely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Zone-relative name (`"@"` for the apex). For SRV records this is the
    /// name *below* the `_service._transport` labels.
    pub name: String,
    /// Time to live.
    #[serde(with = "crate::utils::ttl")]
    pub ttl: Duration,
    /// Type-specific record data.
    pub data: RecordData,
}

impl Record {
    pub fn new(name: impl Into<String>, ttl: Duration, data: RecordData) -> Self {
        Self {
            id: None,
            name: name.into(),
            ttl,
            data,
        }
    }

    pub fn txt(name: impl Into<String>, text: impl Into<String>, ttl: Duration) -> Self {
        Self::new(name, ttl, RecordData::TXT { text: text.into() })
    }

    pub fn mx(
        name: impl Into<String>,
        preference: u16,
        exchange: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self::new(
            name,
            ttl,
            RecordData::MX {
                preference,
                exchange: exchange.into(),
            },
        )
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn record_type(&self) -> &str {
        self.data.record_type()
    }

    /// Projects the record onto its canonical quadruple.
    pub fn rr(&self) -> Rr {
        let name = match &self.data {
            RecordData::SRV {
                service, transport, ..
            } => srv_owner_name(service, transport, &self.name),
            _ => self.name.clone(),
        };

        Rr {
            name,
            ttl: self.ttl,
            record_type: self.record_type().to_string(),
            data: self.data.presentation(),
        }
    }

    /// Parses a canonical quadruple by the grammar of its type.
    pub fn from_rr(rr: &Rr) -> Result<Self> {
        let record_type = rr.record_type.to_ascii_uppercase();
        let data = rr.data.trim();
        let invalid = |detail: String| ProviderError::RecordParseError {
            provider: PROVIDER_ID.to_string(),
            record_name: rr.name.clone(),
            record_type: record_type.clone(),
            detail,
        };

        let mut name = rr.name.clone();
        let parsed = match record_type.as_str() {
            "A" => {
                data.parse::<Ipv4Addr>()
                    .map_err(|_| invalid(format!("invalid IPv4 address '{data}'")))?;
                RecordData::A {
                    address: data.to_string(),
                }
            }
            "AAAA" => {
                data.parse::<Ipv6Addr>()
                    .map_err(|_| invalid(format!("invalid IPv6 address '{data}'")))?;
                RecordData::AAAA {
                    address: data.to_string(),
                }
            }
            "CNAME" => RecordData::CNAME {
                target: non_empty(data).ok_or_else(|| invalid("empty target".to_string()))?,
            },
            "NS" => RecordData::NS {
                nameserver: non_empty(data)
                    .ok_or_else(|| invalid("empty nameserver".to_string()))?,
            },
            // TXT 内容原样保留（不做 trim）
            "TXT" => RecordData::TXT {
                text: rr.data.clone(),
            },
            "MX" => {
                let (preference, exchange) = data.split_once(char::is_whitespace).ok_or_else(|| {
                    invalid(format!(
                        "expected 'preference exchange', got '{data}'"
                    ))
                })?;
                RecordData::MX {
                    preference: preference
                        .parse()
                        .map_err(|_| invalid(format!("invalid preference '{preference}'")))?,
                    exchange: non_empty(exchange.trim())
                        .ok_or_else(|| invalid("empty exchange".to_string()))?,
                }
            }
            "SRV" => {
                let parts: Vec<&str> = data.split_whitespace().collect();
                let [priority, weight, port, target] = parts[..] else {
                    return Err(invalid(format!(
                        "expected 'priority weight port target', got '{data}'"
                    )));
                };
                let (service, transport, rest) = split_srv_owner_name(&rr.name).ok_or_else(|| {
                    invalid(format!(
                        "owner name '{}' is not of the form _service._transport[.name]",
                        rr.name
                    ))
                })?;
                name = rest;
                RecordData::SRV {
                    service,
                    transport,
                    priority: priority
                        .parse()
                        .map_err(|_| invalid(format!("invalid priority '{priority}'")))?,
                    weight: weight
                        .parse()
                        .map_err(|_| invalid(format!("invalid weight '{weight}'")))?,
                    port: port
                        .parse()
                        .map_err(|_| invalid(format!("invalid port '{port}'")))?,
                    target: target.to_string(),
                }
            }
            "CAA" => {
                let parts: Vec<&str> = data.splitn(3, char::is_whitespace).collect();
                let [flags, tag, value] = parts[..] else {
                    return Err(invalid(format!(
                        "expected 'flags tag value', got '{data}'"
                    )));
                };
                RecordData::CAA {
                    flags: flags
                        .parse()
                        .map_err(|_| invalid(format!("invalid flags '{flags}'")))?,
                    tag: tag.to_string(),
                    value: value.trim().trim_matches('"').to_string(),
                }
            }
            "HTTPS" | "SVCB" => {
                let mut parts = data.splitn(3, char::is_whitespace);
                let (Some(priority), Some(target)) = (parts.next(), parts.next()) else {
                    return Err(invalid(format!(
                        "expected 'priority target [params]', got '{data}'"
                    )));
                };
                let priority = priority
                    .parse()
                    .map_err(|_| invalid(format!("invalid priority '{priority}'")))?;
                let target = target.to_string();
                let params = parts
                    .next()
                    .map(str::parse::<SvcParams>)
                    .transpose()
                    .map_err(invalid)?
                    .unwrap_or_default();

                if record_type == "HTTPS" {
                    RecordData::HTTPS {
                        priority,
                        target,
                        params,
                    }
                } else {
                    RecordData::SVCB {
                        priority,
                        target,
                        params,
                    }
                }
            }
            _ => RecordData::Other {
                record_type: record_type.clone(),
                data: rr.data.clone(),
            },
        };

        Ok(Self {
            id: None,
            name,
            ttl: rr.ttl,
            data: parsed,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// `_sip._tcp` + `"www"` -> `"_sip._tcp.www"`; apex omits the suffix.
fn srv_owner_name(service: &str, transport: &str, name: &str) -> String {
    if name.is_empty() || name == "@" {
        format!("_{service}._{transport}")
    } else {
        format!("_{service}._{transport}.{name}")
    }
}

/// Inverse of [`srv_owner_name`].
fn split_srv_owner_name(owner: &str) -> Option<(String, String, String)> {
    let (service, rest) = owner.strip_prefix('_')?.split_once("._")?;
    let (transport, name) = match rest.split_once('.') {
        Some((transport, name)) => (transport, name),
        None => (rest, "@"),
    };
    if service.is_empty() || transport.is_empty() {
        return None;
    }
    Some((service.to_string(), transport.to_string(), name.to_string()))
}

// ============ Configuration ============

/// Validation error for provider configuration.
///
/// Returned when a field is missing, empty, or has an invalid format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// A required field is missing entirely.
    MissingField {
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A field is present but empty/whitespace-only.
    EmptyField {
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A field has an invalid format.
    InvalidFormat {
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
        /// Description of what's wrong with the format.
        reason: String,
    },
}

impl CredentialValidationError {
    /// Key of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field, .. }
            | Self::EmptyField { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "Missing required field: {label}"),
            Self::EmptyField { label, .. } => write!(f, "Field must not be empty: {label}"),
            Self::InvalidFormat { label, reason, .. } => write!(f, "{label}: {reason}"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Account settings for the INWX DomRobot API.
///
/// Serialized with the same keys as the configuration files of the DNS
/// automation hosts that embed this provider:
///
/// ```json
/// { "username": "...", "password": "...", "shared_secret": "...", "endpoint_url": "..." }
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct InwxConfig {
    /// Username of the INWX account.
    pub username: String,
    /// Password of the INWX account.
    pub password: String,
    /// Base32 shared secret, required only when "Mobile TAN" two-factor
    /// authentication is enabled on the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
    /// JSON-RPC endpoint. Defaults to the production endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for InwxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InwxConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl InwxConfig {
    pub const USERNAME: &'static str = "username";
    pub const PASSWORD: &'static str = "password";
    pub const SHARED_SECRET: &'static str = "shared_secret";
    pub const ENDPOINT_URL: &'static str = "endpoint_url";

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            shared_secret: None,
            endpoint_url: None,
        }
    }

    #[must_use]
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Construct the configuration from a flat key-value map, validating fields.
    pub fn from_map(
        map: &HashMap<String, String>,
    ) -> std::result::Result<Self, CredentialValidationError> {
        let config = Self {
            username: Self::get_required_field(map, Self::USERNAME, "Username")?,
            password: Self::get_required_field(map, Self::PASSWORD, "Password")?,
            shared_secret: Self::get_optional_field(map, Self::SHARED_SECRET),
            endpoint_url: Self::get_optional_field(map, Self::ENDPOINT_URL),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads `INWX_USERNAME`, `INWX_PASSWORD`, `INWX_SHARED_SECRET` and
    /// `INWX_ENDPOINT_URL`.
    pub fn from_env() -> std::result::Result<Self, CredentialValidationError> {
        let map: HashMap<String, String> = [
            (Self::USERNAME, "INWX_USERNAME"),
            (Self::PASSWORD, "INWX_PASSWORD"),
            (Self::SHARED_SECRET, "INWX_SHARED_SECRET"),
            (Self::ENDPOINT_URL, "INWX_ENDPOINT_URL"),
        ]
        .into_iter()
        .filter_map(|(key, var)| std::env::var(var).ok().map(|v| (key.to_string(), v)))
        .collect();

        Self::from_map(&map)
    }

    /// Convert the configuration to a `HashMap` for flat key-value storage.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            (Self::USERNAME.to_string(), self.username.clone()),
            (Self::PASSWORD.to_string(), self.password.clone()),
        ]
        .into();
        if let Some(secret) = &self.shared_secret {
            map.insert(Self::SHARED_SECRET.to_string(), secret.clone());
        }
        if let Some(url) = &self.endpoint_url {
            map.insert(Self::ENDPOINT_URL.to_string(), url.clone());
        }
        map
    }

    /// Checks field contents; called by [`from_map`](Self::from_map) and by
    /// the provider builder.
    pub fn validate(&self) -> std::result::Result<(), CredentialValidationError> {
        for (field, label, value) in [
            (Self::USERNAME, "Username", &self.username),
            (Self::PASSWORD, "Password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(CredentialValidationError::EmptyField {
                    field: field.to_string(),
                    label: label.to_string(),
                });
            }
        }

        if let Some(url) = &self.endpoint_url {
            let parsed =
                reqwest::Url::parse(url).map_err(|e| CredentialValidationError::InvalidFormat {
                    field: Self::ENDPOINT_URL.to_string(),
                    label: "Endpoint URL".to_string(),
                    reason: e.to_string(),
                })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(CredentialValidationError::InvalidFormat {
                    field: Self::ENDPOINT_URL.to_string(),
                    label: "Endpoint URL".to_string(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }

        Ok(())
    }

    fn get_required_field(
        map: &HashMap<String, String>,
        key: &str,
        label: &str,
    ) -> std::result::Result<String, CredentialValidationError> {
        match map.get(key) {
            None => Err(CredentialValidationError::MissingField {
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) if v.trim().is_empty() => Err(CredentialValidationError::EmptyField {
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) => Ok(v.clone()),
        }
    }

    fn get_optional_field(map: &HashMap<String, String>, key: &str) -> Option<String> {
        map.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
