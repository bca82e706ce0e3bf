// Discovery answers with the one device this skill controls.
use serde_json::{json, Value};

use crate::directive::{DirectiveRequest, DirectiveResponse, Event};

pub const DISCOVER: &str = "Discover";
pub const DISCOVER_RESPONSE: &str = "Discover.Response";

pub const FEEDER_ENDPOINT_ID: &str = "id123";

/// Descriptor of the bird feeder as the voice assistant sees it: a switch
/// exposing `powerState` that is neither reported proactively nor retrievable.
pub fn discovery_endpoint() -> Value {
    json!({
        "endpointId": FEEDER_ENDPOINT_ID,
        "manufacturerName": "DIY Devices",
        "friendlyName": "Bird Feeder",
        "description": "device to feed birds in the park",
        "displayCategories": ["SWITCH"],
        "cookie": {},
        "capabilities": [{
            "type": "AlexaInterface",
            "interface": "Alexa.PowerController",
            "version": "3",
            "properties": {
                "supported": [{ "name": "powerState" }],
                "proactivelyReported": false,
                "retrievable": false
            }
        }]
    })
}

/// Build the `Discover.Response` event. Namespace and message id are kept
/// from the request header.
pub fn handle_discovery(request: &DirectiveRequest) -> DirectiveResponse {
    let header = &request.directive.header;
    DirectiveResponse {
        context: None,
        event: Event {
            header: header.respond_as(&header.namespace, DISCOVER_RESPONSE),
            endpoint: None,
            payload: json!({ "endpoints": [discovery_endpoint()] }),
        },
    }
}
