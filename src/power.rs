// Power control for the feeder. Only `TurnOn` reaches the broker; `TurnOff`
// is answered locally since the feeder has nothing to stop.
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::config::FeederCommand;
use crate::directive::{
    Context, DirectiveRequest, DirectiveResponse, Event, PowerState, Property, ALEXA_NAMESPACE,
    POWER_NAMESPACE,
};
use crate::error::SkillError;
use crate::mqtt::Publisher;

pub const TURN_ON: &str = "TurnOn";
pub const TURN_OFF: &str = "TurnOff";

const UNCERTAINTY_MS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    TurnOn,
    TurnOff,
}

impl PowerCommand {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TURN_ON => Some(PowerCommand::TurnOn),
            TURN_OFF => Some(PowerCommand::TurnOff),
            _ => None,
        }
    }
}

pub async fn handle_power_control(
    request: &DirectiveRequest,
    command: PowerCommand,
    publisher: &dyn Publisher,
    feeder: &FeederCommand,
) -> Result<DirectiveResponse, SkillError> {
    let state = match command {
        PowerCommand::TurnOn => {
            publisher.publish(&feeder.topic, &feeder.payload, true).await?;
            PowerState::On
        }
        PowerCommand::TurnOff => PowerState::Off,
    };

    Ok(power_response(request, state))
}

fn power_response(request: &DirectiveRequest, state: PowerState) -> DirectiveResponse {
    let directive = &request.directive;
    DirectiveResponse {
        context: Some(Context {
            properties: vec![Property {
                namespace: POWER_NAMESPACE.to_string(),
                name: "powerState".to_string(),
                value: state,
                time_of_sample: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                uncertainty_in_milliseconds: UNCERTAINTY_MS,
            }],
        }),
        event: Event {
            header: directive
                .header
                .respond_as(ALEXA_NAMESPACE, "Response")
                .with_response_id(),
            endpoint: directive.endpoint.clone(),
            payload: json!({}),
        },
    }
}
