//! The API documentation catalog.
//!
//! The raw catalog is a JSON document embedded at compile time. It is
//! expanded into typed endpoint descriptors with parameter tables,
//! canned responses and request snippets.

mod snippet;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FindorError;

pub use snippet::{code_examples, CodeExample, Language};

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// Group name for every endpoint in the builtin catalog.
pub const DEFAULT_GROUP: &str = "API";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Whether request snippets for this method carry a JSON body.
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    pub path: Vec<Parameter>,
    pub query: Vec<Parameter>,
    pub body: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseExample {
    pub status: u16,
    pub description: String,
    pub example: String,
}

impl ResponseExample {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub method: HttpMethod,
    pub path: String,
    pub parameters: Parameters,
    pub responses: Vec<ResponseExample>,
    pub examples: Vec<CodeExample>,
}

impl Endpoint {
    pub fn example(&self, language: Language) -> Option<&CodeExample> {
        self.examples.iter().find(|ex| ex.language == language)
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointGroup {
    pub group: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOverview {
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub authentication: String,
    pub best_practices: Vec<String>,
    pub rate_limiting: String,
    pub support: String,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub overview: ApiOverview,
    pub groups: Vec<EndpointGroup>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    title: String,
    description: String,
    base_url: String,
    authentication: String,
    #[serde(default)]
    best_practices: Vec<String>,
    endpoints: Vec<RawEndpoint>,
    #[serde(default)]
    rate_limiting: String,
    #[serde(default)]
    support: String,
    #[serde(default)]
    notes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    name: String,
    method: String,
    path: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    request_body: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    response_example: Value,
}

impl Catalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self, FindorError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self, FindorError> {
        let raw: RawCatalog =
            serde_json::from_str(raw).map_err(|e| FindorError::Catalog(e.to_string()))?;

        let endpoints = raw
            .endpoints
            .iter()
            .map(|ep| build_endpoint(ep, &raw.base_url))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            overview: ApiOverview {
                title: raw.title,
                description: raw.description,
                base_url: raw.base_url,
                authentication: raw.authentication,
                best_practices: raw.best_practices,
                rate_limiting: raw.rate_limiting,
                support: raw.support,
                notes: raw.notes,
            },
            groups: vec![EndpointGroup {
                group: DEFAULT_GROUP.to_string(),
                endpoints,
            }],
        })
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.groups.iter().flat_map(|g| g.endpoints.iter())
    }

    pub fn find(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints().find(|ep| ep.id == id)
    }

    /// Case-insensitive search over endpoint titles and descriptions.
    /// Groups left without endpoints are dropped; a blank term returns
    /// every group untouched.
    pub fn filter_groups(&self, term: &str) -> Vec<EndpointGroup> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.groups.clone();
        }
        self.groups
            .iter()
            .map(|g| EndpointGroup {
                group: g.group.clone(),
                endpoints: g
                    .endpoints
                    .iter()
                    .filter(|ep| ep.matches(&needle))
                    .cloned()
                    .collect(),
            })
            .filter(|g| !g.endpoints.is_empty())
            .collect()
    }
}

fn build_endpoint(raw: &RawEndpoint, base_url: &str) -> Result<Endpoint, FindorError> {
    let method = HttpMethod::parse_str(&raw.method).ok_or_else(|| {
        FindorError::Catalog(format!("unknown method {} for {}", raw.method, raw.name))
    })?;

    let body: Vec<Parameter> = raw
        .request_body
        .iter()
        .flatten()
        .map(|(name, desc)| {
            let desc = match desc {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let parsed = parse_param(&desc);
            Parameter {
                name: name.clone(),
                type_name: parsed.type_name,
                description: parsed.description,
                required: parsed.required,
            }
        })
        .collect();

    let examples = code_examples(method, base_url, &raw.path, &body);

    Ok(Endpoint {
        id: endpoint_id(&raw.name),
        title: raw.name.clone(),
        description: raw.description.clone(),
        method,
        path: raw.path.clone(),
        parameters: Parameters {
            path: Vec::new(),
            query: Vec::new(),
            body,
        },
        responses: vec![
            ResponseExample {
                status: 200,
                description: "Successful Response".into(),
                example: pretty(&raw.response_example),
            },
            ResponseExample {
                status: 401,
                description: "Unauthorized - Invalid API token.".into(),
                example: pretty(&serde_json::json!({ "error": "Invalid API token." })),
            },
            ResponseExample {
                status: 429,
                description: "Too Many Requests - Rate limit exceeded.".into(),
                example: pretty(&serde_json::json!({ "error": "Rate limit exceeded." })),
            },
        ],
        examples,
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Slug used to address an endpoint: lowercase title, whitespace runs
/// collapsed to `-`.
pub fn endpoint_id(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParam {
    pub type_name: String,
    pub required: bool,
    pub description: String,
}

/// Parse a catalog parameter string such as `integer (optional, default: 4)`.
pub fn parse_param(raw: &str) -> ParsedParam {
    ParsedParam {
        type_name: raw.split(' ').next().unwrap_or_default().to_string(),
        required: raw.contains("(required)"),
        description: raw
            .replacen("(required)", "", 1)
            .replacen("(optional,", "Optional,", 1)
            .trim()
            .to_string(),
    }
}
