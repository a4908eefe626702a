use crate::error::{AppError, AppResult};
use crate::models::GenerateRequest;

/// Checks a request before it is handed to the transport. A request that
/// fails here is never submitted.
pub fn validate_generate_request(request: &GenerateRequest) -> AppResult<()> {
    if request.input_code.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Input code must not be empty".to_string(),
        ));
    }

    if request.model.trim().is_empty() {
        return Err(AppError::ValidationError(
            "A model must be selected".to_string(),
        ));
    }

    Ok(())
}
