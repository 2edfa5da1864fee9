//! Authorization middleware.
//!
//! Each route is looked up in [`ROUTE_ACCESS`]. Public routes pass straight
//! through. Protected routes resolve the `X-User-Id` header to a [`Caller`],
//! check the required capability and hand the caller to the handler as a
//! request extension.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::controller::AppState;
use crate::application::ports::Store;
use crate::application::use_cases::Caller;
use crate::domain::identity::Capability;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Access rule of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone.
    Public,
    /// A known user whose role grants the capability.
    Requires(Capability),
}

/// `(method, path pattern, access)`. `{}` segments match any value.
/// Routes not listed are public.
pub const ROUTE_ACCESS: &[(&str, &str, Access)] = &[
    ("GET", "/api/usuarios", Access::Requires(Capability::ManageUsers)),
    ("GET", "/api/usuarios/{}", Access::Requires(Capability::ManageUsers)),
    ("PUT", "/api/usuarios/{}", Access::Requires(Capability::ManageUsers)),
    ("DELETE", "/api/usuarios/{}", Access::Requires(Capability::ManageUsers)),
    ("POST", "/api/instrumentos", Access::Requires(Capability::ManageCatalog)),
    ("PUT", "/api/instrumentos/{}", Access::Requires(Capability::ManageCatalog)),
    ("DELETE", "/api/instrumentos/{}", Access::Requires(Capability::ManageCatalog)),
    ("PATCH", "/api/instrumentos/{}/precio", Access::Requires(Capability::ManageCatalog)),
    ("PATCH", "/api/instrumentos/{}/stock", Access::Requires(Capability::ManageCatalog)),
    ("POST", "/api/categorias", Access::Requires(Capability::ManageCatalog)),
    ("PUT", "/api/categorias/{}", Access::Requires(Capability::ManageCatalog)),
    ("DELETE", "/api/categorias/{}", Access::Requires(Capability::ManageCatalog)),
    ("POST", "/api/pedidos", Access::Requires(Capability::PlaceOrders)),
    ("GET", "/api/pedidos", Access::Requires(Capability::ViewAllOrders)),
    ("GET", "/api/pedidos/usuario/{}", Access::Requires(Capability::PlaceOrders)),
    ("GET", "/api/pedidos/{}", Access::Requires(Capability::PlaceOrders)),
    ("PATCH", "/api/pedidos/{}/estado", Access::Requires(Capability::ManageOrders)),
    ("DELETE", "/api/pedidos/{}", Access::Requires(Capability::ManageOrders)),
];

fn matches(pattern: &str, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    let mut expected = pattern.split('/');
    let mut actual = path.split('/');
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return true,
            (Some("{}"), Some(segment)) if !segment.is_empty() => {}
            (Some(want), Some(got)) if want == got => {}
            _ => return false,
        }
    }
}

/// Access rule for a request.
#[must_use]
pub fn required_access(method: &Method, path: &str) -> Access {
    ROUTE_ACCESS
        .iter()
        .find(|(verb, pattern, _)| method.as_str() == *verb && matches(pattern, path))
        .map_or(Access::Public, |(_, _, access)| *access)
}

/// Middleware enforcing [`ROUTE_ACCESS`].
pub async fn authorize<S>(State(state): State<AppState<S>>, mut request: Request, next: Next) -> Response
where
    S: Store,
{
    let Access::Requires(capability) = required_access(request.method(), request.uri().path())
    else {
        return next.run(request).await;
    };

    let header = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    let caller: Result<Caller, _> = state
        .accounts
        .resolve_caller(header)
        .await
        .and_then(|caller| caller.require(capability).map(|()| caller));

    match caller {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(
                method = %request.method(),
                path = request.uri().path(),
                error = %err,
                "Request not authorized"
            );
            err.into_response()
        }
    }
}
