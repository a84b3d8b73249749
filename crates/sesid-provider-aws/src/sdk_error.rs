//! Turning SDK failures into readable messages

use aws_sdk_ses::error::SdkError;

/// Extract a human-readable description from an SDK error
///
/// Service errors carry the service's own message; transport failures are
/// summarized by kind. Both SES and Route53 share the same `SdkError` type.
pub(crate) fn sdk_error_details<E, R>(e: &SdkError<E, R>) -> String
where
    E: std::fmt::Display + std::fmt::Debug,
    R: std::fmt::Debug,
{
    match e {
        SdkError::ServiceError(service_err) => format!("{}", service_err.err()),
        SdkError::TimeoutError(_) => "Request timed out".to_string(),
        SdkError::DispatchFailure(dispatch_err) => {
            if dispatch_err.is_io() {
                "Network error: unable to reach the AWS endpoint".to_string()
            } else if dispatch_err.is_timeout() {
                "Connection timed out".to_string()
            } else {
                format!("Dispatch failure: {:?}", dispatch_err)
            }
        }
        SdkError::ConstructionFailure(_) => "Invalid request configuration".to_string(),
        SdkError::ResponseError(resp_err) => {
            format!("Unexpected response from AWS: {:?}", resp_err)
        }
        _ => format!("{}", e),
    }
}
