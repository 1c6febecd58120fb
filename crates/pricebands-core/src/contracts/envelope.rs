use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    pub error: ErrorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContract {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
}

pub fn success<T>(command: &str, data: T) -> PipelineResult<SuccessEnvelope>
where
    T: Serialize,
{
    let json_data = serde_json::to_value(data)
        .map_err(|err| PipelineError::internal_serialization(&err.to_string()))?;
    Ok(SuccessEnvelope {
        ok: true,
        command: command.to_string(),
        version: API_VERSION.to_string(),
        data: json_data,
    })
}

pub fn failure_from_error(error: &PipelineError) -> FailureEnvelope {
    FailureEnvelope {
        ok: false,
        error: ErrorContract {
            code: error.code.clone(),
            message: error.message.clone(),
            recovery_steps: error.recovery_steps.clone(),
        },
        data: error.data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{failure_from_error, success};
    use crate::PipelineError;

    #[test]
    fn success_wraps_data_with_command_and_version() {
        let envelope = success("config show", serde_json::json!({"batch_correction": true}));
        assert!(envelope.is_ok());
        if let Ok(envelope) = envelope {
            assert!(envelope.ok);
            assert_eq!(envelope.command, "config show");
            assert_eq!(envelope.version, crate::API_VERSION);
            assert_eq!(envelope.data["batch_correction"], true);
        }
    }

    #[test]
    fn failure_carries_code_steps_and_data() {
        let error = PipelineError::configuration_invalid("liability.rates", "bad");
        let envelope = failure_from_error(&error);
        assert!(!envelope.ok);
        assert_eq!(envelope.error.code, "configuration_invalid");
        assert_eq!(envelope.error.recovery_steps.len(), 2);
        assert!(envelope.data.is_some());
    }
}
