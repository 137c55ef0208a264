use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::AppError;
use crate::state::AppState;

/// Validate an optional bearer token and expose its claims to the GraphQL handler.
/// Requests without a token pass through anonymously.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.jwt_service().verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert::<Claims>(claims);
            }
            Err(_) => {
                return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
            }
        }
    }

    Ok(next.run(request).await)
}
