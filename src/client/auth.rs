use std::future::Future;

use super::error::ClientError;

/// Runs `primary`; only if it fails runs `fallback`. When both fail the
/// error carries both causes.
pub async fn first_success<T, P, PF, F, FF>(primary: P, fallback: F) -> Result<T, ClientError>
where
    P: FnOnce() -> PF,
    PF: Future<Output = Result<T, ClientError>>,
    F: FnOnce() -> FF,
    FF: Future<Output = Result<T, ClientError>>,
{
    let user_error = match primary().await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match fallback().await {
        Ok(value) => Ok(value),
        Err(admin_error) => Err(ClientError::LoginFailed {
            user: Box::new(user_error),
            admin: Box::new(admin_error),
        }),
    }
}
