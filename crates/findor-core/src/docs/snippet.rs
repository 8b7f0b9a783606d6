use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{HttpMethod, Parameter};

const AUTH_PLACEHOLDER: &str = "Bearer <your_api_token>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "cURL")]
    Curl,
    JavaScript,
    Python,
}

impl Language {
    pub const ALL: &'static [Language] = &[Language::Curl, Language::JavaScript, Language::Python];

    pub fn label(&self) -> &'static str {
        match self {
            Language::Curl => "cURL",
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "curl" => Some(Language::Curl),
            "js" | "javascript" => Some(Language::JavaScript),
            "py" | "python" => Some(Language::Python),
            _ => None,
        }
    }

    /// Next tab, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            Language::Curl => Language::JavaScript,
            Language::JavaScript => Language::Python,
            Language::Python => Language::Curl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    pub language: Language,
    pub code: String,
}

fn placeholder(type_name: &str) -> Value {
    match type_name {
        "integer" => Value::from(4),
        "string" => Value::from("your_search_query"),
        _ => Value::from("value"),
    }
}

fn indented_json(value: &Value, indent: &[u8]) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_default(),
        Err(_) => value.to_string(),
    }
}

/// Request snippets for one endpoint in every supported language.
///
/// A JSON body is only included when the method sends one and the
/// endpoint declares body parameters; its values are type placeholders.
pub fn code_examples(
    method: HttpMethod,
    base_url: &str,
    path: &str,
    body_params: &[Parameter],
) -> Vec<CodeExample> {
    let url = format!("{}{path}", base_url.trim_end_matches('/'));
    let body = if method.sends_body() && !body_params.is_empty() {
        let map: Map<String, Value> = body_params
            .iter()
            .map(|p| (p.name.clone(), placeholder(&p.type_name)))
            .collect();
        Some(Value::Object(map))
    } else {
        None
    };

    Language::ALL
        .iter()
        .map(|&language| CodeExample {
            language,
            code: match language {
                Language::Curl => curl(method, &url, body.as_ref()),
                Language::JavaScript => javascript(method, &url, body.as_ref()),
                Language::Python => python(method, &url, body.as_ref()),
            },
        })
        .collect()
}

fn curl(method: HttpMethod, url: &str, body: Option<&Value>) -> String {
    let mut out = format!("curl -X {method} \"{url}\" \\\n  -H \"Authorization: {AUTH_PLACEHOLDER}\"");
    if let Some(body) = body {
        out.push_str(" \\\n  -H \"Content-Type: application/json\"");
        out.push_str(&format!(" \\\n  -d '{}'", indented_json(body, b"  ")));
    }
    out
}

fn javascript(method: HttpMethod, url: &str, body: Option<&Value>) -> String {
    let mut out = format!(
        "fetch('{url}', {{\n  method: '{method}',\n  headers: {{\n    'Authorization': '{AUTH_PLACEHOLDER}'"
    );
    if body.is_some() {
        out.push_str(",\n    'Content-Type': 'application/json'");
    }
    out.push_str("\n  }");
    if let Some(body) = body {
        out.push_str(&format!(
            ",\n  body: JSON.stringify({})",
            indented_json(body, b"  ")
        ));
    }
    out.push_str("\n})\n.then(response => response.json())\n.then(data => console.log(data));");
    out
}

fn python(method: HttpMethod, url: &str, body: Option<&Value>) -> String {
    let mut out = String::from("import requests\n");
    if body.is_some() {
        out.push('\n');
    }
    out.push_str(&format!(
        "\nurl = \"{url}\"\nheaders = {{\n    \"Authorization\": \"{AUTH_PLACEHOLDER}\""
    ));
    if body.is_some() {
        out.push_str(",\n    \"Content-Type\": \"application/json\"");
    }
    out.push_str("\n}");
    if let Some(body) = body {
        out.push_str(&format!("\ndata = {}", indented_json(body, b"    ")));
    }
    let json_arg = if body.is_some() { ", json=data" } else { "" };
    out.push_str(&format!(
        "\n\nresponse = requests.{}(url, headers=headers{json_arg})\n\nprint(response.json())",
        method.as_str().to_lowercase()
    ));
    out
}
