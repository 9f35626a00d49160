//! bcrypt hashing on the blocking pool, so a slow hash never stalls the runtime.

use crate::error::{ApiError, ApiResult};

pub async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

/// Returns `false` for a mismatch. A malformed stored hash is also a mismatch rather than
/// a server error, so a corrupted row cannot be told apart from a wrong password.
pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(ApiError::internal)?;
    Ok(verified.unwrap_or(false))
}
