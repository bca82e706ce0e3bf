// Single entry point for directives: route on header namespace/name and
// turn any failure into an `Alexa.ErrorResponse` event.
use serde_json::json;

use crate::config::FeederCommand;
use crate::directive::{
    DirectiveRequest, DirectiveResponse, Event, Header, ALEXA_NAMESPACE, DISCOVERY_NAMESPACE,
    POWER_NAMESPACE,
};
use crate::discovery::{self, DISCOVER};
use crate::error::SkillError;
use crate::mqtt::Publisher;
use crate::power::{self, PowerCommand, TURN_OFF, TURN_ON};

const UNSUPPORTED: &str = "unsupported";

pub async fn handle_directive(
    request: &DirectiveRequest,
    publisher: &dyn Publisher,
    feeder: &FeederCommand,
) -> DirectiveResponse {
    let header = &request.directive.header;

    let result = match (header.namespace.as_str(), header.name.as_str()) {
        (DISCOVERY_NAMESPACE, DISCOVER) => {
            tracing::debug!("Discover request {}", to_json(&request.redacted()));
            Ok(discovery::handle_discovery(request))
        }
        (POWER_NAMESPACE, name) => match PowerCommand::from_name(name) {
            Some(command) => {
                tracing::debug!("{} request {}", name, to_json(&request.redacted()));
                power::handle_power_control(request, command, publisher, feeder).await
            }
            None => Err(unsupported(request)),
        },
        _ => Err(unsupported(request)),
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(message_id = %header.message_id, "directive failed: {}", e);
            error_response(request, &e)
        }
    };

    tracing::debug!("{} response {}", header.namespace, to_json(&response.redacted()));
    response
}

pub fn error_response(request: &DirectiveRequest, error: &SkillError) -> DirectiveResponse {
    let directive = &request.directive;
    DirectiveResponse {
        context: None,
        event: Event {
            header: directive
                .header
                .respond_as(ALEXA_NAMESPACE, "ErrorResponse")
                .with_response_id(),
            endpoint: directive.endpoint.clone(),
            payload: json!({
                "type": error.error_type(),
                "message": error.to_string(),
            }),
        },
    }
}

/// Label pair for `directives_total`. Directives we do not route all share
/// one series so client input cannot grow the registry.
pub fn metric_labels(header: &Header) -> (&'static str, &'static str) {
    match (header.namespace.as_str(), header.name.as_str()) {
        (DISCOVERY_NAMESPACE, DISCOVER) => (DISCOVERY_NAMESPACE, DISCOVER),
        (POWER_NAMESPACE, TURN_ON) => (POWER_NAMESPACE, TURN_ON),
        (POWER_NAMESPACE, TURN_OFF) => (POWER_NAMESPACE, TURN_OFF),
        _ => (UNSUPPORTED, UNSUPPORTED),
    }
}

fn unsupported(request: &DirectiveRequest) -> SkillError {
    let header = &request.directive.header;
    SkillError::UnsupportedDirective {
        namespace: header.namespace.clone(),
        name: header.name.clone(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
