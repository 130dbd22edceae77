//! Read-only view over the loosely-shaped `endpoint_data` JSON.
//!
//! Accepts both OpenAPI-ish shapes (`parameters[].schema.type`,
//! `responses.200.schema.properties`) and flat ones (`params`, `response`).

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamView {
    pub name: String,
    pub location: String,
    pub kind: Option<String>,
    pub required: bool,
    /// Has maxLength / pattern / enum / format / min / max.
    pub constrained: bool,
}

#[derive(Debug, Clone)]
pub struct EndpointView<'a> {
    raw: &'a Value,
    pub method: String,
    pub path: String,
    pub url: Option<String>,
    pub parameters: Vec<ParamView>,
}

const CONSTRAINT_KEYS: [&str; 8] = [
    "maxLength",
    "max_length",
    "pattern",
    "enum",
    "format",
    "minimum",
    "maximum",
    "max",
];

impl<'a> EndpointView<'a> {
    pub fn new(raw: &'a Value) -> Self {
        let method = str_field(raw, &["method", "http_method", "verb"])
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let url = str_field(raw, &["url", "base_url", "server"]).map(str::to_string);
        let path = str_field(raw, &["path", "route", "endpoint"])
            .map(str::to_string)
            .or_else(|| url.as_deref().map(path_of_url))
            .unwrap_or_else(|| "/".to_string());

        let parameters = ["parameters", "params"]
            .iter()
            .filter_map(|k| raw.get(*k))
            .flat_map(param_entries)
            .collect();

        Self {
            raw,
            method,
            path,
            url,
            parameters,
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }

    pub fn uses_plain_http(&self) -> bool {
        self.url
            .as_deref()
            .is_some_and(|u| u.to_ascii_lowercase().starts_with("http://"))
    }

    /// Authentication scheme, lowercased. `None` when the endpoint declares none.
    pub fn auth_scheme(&self) -> Option<String> {
        let value = ["auth", "authentication", "security", "auth_type"]
            .iter()
            .find_map(|k| self.raw.get(*k))?;
        scheme_of(value)
    }

    /// Where an API key is sent (`header` / `query`), if declared.
    pub fn api_key_location(&self) -> Option<String> {
        let value = ["auth", "authentication", "security"]
            .iter()
            .find_map(|k| self.raw.get(*k))?;
        let obj = match value {
            Value::Array(items) => items.first()?,
            other => other,
        };
        obj.get("in")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase)
    }

    /// Header names, lowercased.
    pub fn header_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.raw.get("headers") {
            Some(Value::Object(map)) => map.keys().map(|k| k.to_ascii_lowercase()).collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|h| h.as_str().or_else(|| h.get("name").and_then(Value::as_str)))
                .map(str::to_ascii_lowercase)
                .collect(),
            _ => Vec::new(),
        };
        names.extend(
            self.parameters
                .iter()
                .filter(|p| p.location == "header")
                .map(|p| p.name.to_ascii_lowercase()),
        );
        names
    }

    /// Declared rate-limit configuration, if any.
    pub fn rate_limit(&self) -> Option<&'a Value> {
        ["rate_limit", "rate_limiting", "x-rate-limit", "throttle"]
            .iter()
            .find_map(|k| self.raw.get(*k))
            .filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
    }

    /// Field names appearing in the response schema (recursively).
    pub fn response_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        for key in ["response_schema", "responses", "response"] {
            if let Some(v) = self.raw.get(key) {
                collect_field_names(v, &mut out);
            }
        }
        out.sort();
        out.dedup();
        out
    }

    pub fn has_request_body_schema(&self) -> bool {
        ["request_body", "requestBody", "body_schema", "body"]
            .iter()
            .any(|k| self.raw.get(*k).is_some_and(|v| !v.is_null()))
    }
}

fn str_field<'v>(raw: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter().find_map(|k| raw.get(*k).and_then(Value::as_str))
}

fn path_of_url(url: &str) -> String {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    match after_scheme.find('/') {
        Some(idx) => after_scheme[idx..].to_string(),
        None => "/".to_string(),
    }
}

fn scheme_of(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("unspecified".to_string()),
        Value::String(s) if s.trim().is_empty() || s.eq_ignore_ascii_case("none") => None,
        Value::String(s) => Some(s.to_ascii_lowercase()),
        Value::Array(items) => items.iter().find_map(scheme_of),
        Value::Object(map) => ["type", "scheme", "name"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_ascii_lowercase)
            .or_else(|| (!map.is_empty()).then(|| "unspecified".to_string())),
        _ => None,
    }
}

fn param_entries(value: &Value) -> Vec<ParamView> {
    match value {
        Value::Array(items) => items.iter().filter_map(param_from_object).collect(),
        // `{"q": {"type": "string"}}` or `{"q": "string"}`
        Value::Object(map) => map
            .iter()
            .map(|(name, spec)| {
                let mut p = param_from_object(spec).unwrap_or_else(|| ParamView {
                    name: String::new(),
                    location: "query".to_string(),
                    kind: spec.as_str().map(str::to_string),
                    required: false,
                    constrained: false,
                });
                p.name = name.clone();
                p
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn param_from_object(value: &Value) -> Option<ParamView> {
    let obj = value.as_object()?;
    let schema = obj.get("schema").and_then(Value::as_object);
    let lookup = |key: &str| obj.get(key).or_else(|| schema.and_then(|s| s.get(key)));

    Some(ParamView {
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        location: obj
            .get("in")
            .and_then(Value::as_str)
            .unwrap_or("query")
            .to_ascii_lowercase(),
        kind: lookup("type").and_then(Value::as_str).map(str::to_string),
        required: lookup("required").and_then(Value::as_bool).unwrap_or(false),
        constrained: CONSTRAINT_KEYS.iter().any(|k| lookup(k).is_some()),
    })
}

fn collect_field_names(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let structural = matches!(
                    key.as_str(),
                    "properties" | "schema" | "items" | "content" | "type" | "description"
                ) || key.chars().all(|c| c.is_ascii_digit())
                    || key.contains('/');
                if !structural {
                    out.push(key.clone());
                }
                collect_field_names(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_field_names(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_openapi_like_shape() {
        let raw = json!({
            "method": "post",
            "url": "http://api.example.com/v1/users",
            "parameters": [
                {"name": "q", "in": "query", "schema": {"type": "string", "maxLength": 20}},
                {"name": "X-Trace", "in": "header", "schema": {"type": "string"}}
            ],
            "security": [{"type": "apiKey", "in": "query"}],
            "responses": {"200": {"schema": {"properties": {"email": {"type": "string"}}}}}
        });
        let view = EndpointView::new(&raw);

        assert_eq!(view.label(), "POST /v1/users");
        assert!(view.is_mutating());
        assert!(view.uses_plain_http());
        assert_eq!(view.parameters.len(), 2);
        assert!(view.parameters[0].constrained);
        assert!(!view.parameters[1].constrained);
        assert_eq!(view.auth_scheme().as_deref(), Some("apikey"));
        assert_eq!(view.api_key_location().as_deref(), Some("query"));
        assert!(view.header_names().contains(&"x-trace".to_string()));
        assert_eq!(view.response_fields(), vec!["email".to_string()]);
    }

    #[test]
    fn flat_shape_and_defaults() {
        let raw = json!({
            "path": "/search",
            "params": {"term": "string"},
            "auth": "none"
        });
        let view = EndpointView::new(&raw);

        assert_eq!(view.method, "GET");
        assert_eq!(view.parameters[0].name, "term");
        assert_eq!(view.parameters[0].kind.as_deref(), Some("string"));
        assert!(view.auth_scheme().is_none());
        assert!(view.rate_limit().is_none());
    }

    #[test]
    fn empty_endpoint_is_root_get() {
        let raw = json!({});
        let view = EndpointView::new(&raw);
        assert_eq!(view.label(), "GET /");
        assert!(view.parameters.is_empty());
        assert!(view.response_fields().is_empty());
    }
}
