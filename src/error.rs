use crate::llm::LlmError;
use crate::models::api::ErrorResponse;
use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    ServiceUnavailable,
    Generation,
    Unexpected,
}

/// Terminal outcome of a chat request that did not produce a reply.
///
/// `Display` is the exact text sent back to the caller; the wrapped detail
/// only ever reaches the log.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Could not recognize speech from audio.")]
    SpeechNotRecognized,

    #[error("No message or recognizable audio received.")]
    NoMessage,

    #[error("AI model not initialized.")]
    ModelNotInitialized,

    #[error("Sorry, I encountered an error generating a response.")]
    Generation(#[source] LlmError),

    #[error("An unexpected error occurred.")]
    Unexpected(String),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::SpeechNotRecognized | AgentError::NoMessage => ErrorKind::ClientInput,
            AgentError::ModelNotInitialized => ErrorKind::ServiceUnavailable,
            AgentError::Generation(_) => ErrorKind::Generation,
            AgentError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
            ErrorKind::ServiceUnavailable
            | ErrorKind::Generation
            | ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_kind() {
        let cases = [
            (AgentError::SpeechNotRecognized, ErrorKind::ClientInput, 400),
            (AgentError::NoMessage, ErrorKind::ClientInput, 400),
            (AgentError::ModelNotInitialized, ErrorKind::ServiceUnavailable, 500),
            (AgentError::Generation(LlmError::EmptyResponse(None)), ErrorKind::Generation, 500),
            (AgentError::Unexpected("boom".into()), ErrorKind::Unexpected, 500),
        ];
        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind, "{:?}", err);
            assert_eq!(err.status_code().as_u16(), status, "{:?}", err);
        }
    }

    #[test]
    fn messages_do_not_leak_detail() {
        let err = AgentError::Generation(LlmError::Config("secret-ish detail".into()));
        assert_eq!(err.to_string(), "Sorry, I encountered an error generating a response.");

        let err = AgentError::Unexpected("stack of details".into());
        assert_eq!(err.to_string(), "An unexpected error occurred.");
    }
}
