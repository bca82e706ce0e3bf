// Wire types for smart-home directives and the events we answer with.
// Only the fields we read or rewrite are typed; everything else in the
// header and endpoint is kept in `extra` and echoed back unchanged.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DISCOVERY_NAMESPACE: &str = "Alexa.Discovery";
pub const POWER_NAMESPACE: &str = "Alexa.PowerController";
pub const ALEXA_NAMESPACE: &str = "Alexa";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveRequest {
    pub directive: Directive,
}

impl DirectiveRequest {
    /// Copy with every `scope` (it carries the bearer token) removed, for logging.
    pub fn redacted(&self) -> DirectiveRequest {
        let mut copy = self.clone();
        if let Some(endpoint) = copy.directive.endpoint.as_mut() {
            endpoint.extra.remove("scope");
        }
        if let Some(payload) = copy.directive.payload.as_object_mut() {
            payload.remove("scope");
        }
        copy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub namespace: String,
    pub name: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    /// Copy of this header re-addressed to `namespace`/`name`.
    pub fn respond_as(&self, namespace: &str, name: &str) -> Header {
        Header {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Response events carry the request message id with a `-R` suffix.
    pub fn with_response_id(mut self) -> Header {
        self.message_id.push_str("-R");
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub endpoint_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    pub event: Event,
}

impl DirectiveResponse {
    /// Echoed endpoints carry the request scope; drop it before logging.
    pub fn redacted(&self) -> DirectiveResponse {
        let mut copy = self.clone();
        if let Some(endpoint) = copy.event.endpoint.as_mut() {
            endpoint.extra.remove("scope");
        }
        copy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub namespace: String,
    pub name: String,
    pub value: PowerState,
    pub time_of_sample: String,
    pub uncertainty_in_milliseconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}
