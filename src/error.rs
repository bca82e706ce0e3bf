// Domain errors surfaced to the voice assistant as `Alexa.ErrorResponse`
// events. Plumbing (startup, config) keeps using `anyhow`.
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("unsupported directive {namespace}/{name}")]
    UnsupportedDirective { namespace: String, name: String },

    #[error("endpoint unreachable: {0}")]
    EndpointUnreachable(String),

    #[error("broker did not acknowledge the publish within {0:?}")]
    PublishTimeout(Duration),
}

impl SkillError {
    /// The `payload.type` value of the error event.
    pub fn error_type(&self) -> &'static str {
        match self {
            SkillError::UnsupportedDirective { .. } => "INVALID_DIRECTIVE",
            SkillError::EndpointUnreachable(_) | SkillError::PublishTimeout(_) => {
                "ENDPOINT_UNREACHABLE"
            }
        }
    }
}
