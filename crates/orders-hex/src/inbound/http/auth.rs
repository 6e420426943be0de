use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AppError;

pub const ADMIN_KEY_HEADER: &str = "x-api-key";

fn tag(key: &str) -> Option<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(b"orders-admin").ok()?;
    mac.update(key.as_bytes());
    Some(mac)
}

/// Constant-time key comparison: both sides are MACed and the tags compared with `verify_slice`.
fn keys_match(supplied: &str, expected: &str) -> bool {
    let (Some(expected), Some(supplied)) = (tag(expected), tag(supplied)) else {
        return false;
    };
    supplied
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok()
}

/// Gate for `/manage`: the request must carry the configured admin key.
pub(crate) async fn require_admin_key(
    State(expected): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let supplied = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    let verdict = match supplied {
        Some(key) if !expected.is_empty() && keys_match(key, &expected) => Ok(()),
        Some(_) => {
            tracing::warn!(uri = %request.uri(), "admin request with wrong api key");
            Err(AppError::Forbidden("invalid api key".into()))
        }
        None => Err(AppError::Forbidden("missing api key".into())),
    };
    verdict?;
    Ok(next.run(request).await)
}
