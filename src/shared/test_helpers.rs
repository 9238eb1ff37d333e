#[cfg(test)]
use crate::features::auth::model::{AuthenticatedUser, Role};

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
pub const TEST_WORKER_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0001);

#[cfg(test)]
pub fn create_authority_user() -> AuthenticatedUser {
    AuthenticatedUser {
        session_id: Uuid::nil(),
        role: Role::Authority,
        subject_id: "authority@city.gov".to_string(),
        display_name: "Municipal Authority".to_string(),
        expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
    }
}

#[cfg(test)]
pub fn create_worker_user() -> AuthenticatedUser {
    AuthenticatedUser {
        session_id: Uuid::nil(),
        role: Role::Worker,
        subject_id: TEST_WORKER_ID.to_string(),
        display_name: "Test Worker".to_string(),
        expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
    }
}

#[cfg(test)]
async fn inject_authority_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_authority_user());
    next.run(request).await
}

#[cfg(test)]
async fn inject_worker_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_worker_user());
    next.run(request).await
}

#[cfg(test)]
pub fn with_authority_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_authority_middleware))
}

#[cfg(test)]
pub fn with_worker_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_worker_middleware))
}
