//! Route tagging at registration time.
//!
//! A tagged method router stamps its class onto every response it produces,
//! so the capture layer can read it after the handler has run.

use axum::middleware::map_response;
use axum::response::Response;
use axum::routing::MethodRouter;

use crate::routing::RouteClass;

/// Tag `route` with `class`.
///
/// The tag covers every method registered on `route` so far. Methods chained
/// on afterwards stay untagged, so tag before adding siblings that are not
/// part of the class:
///
/// ```ignore
/// Router::new().route("/api/auth", tag(put(login), RouteClass::AuthAttempt).delete(logout))
/// ```
pub fn tag<S>(route: MethodRouter<S>, class: RouteClass) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(map_response(move |mut response: Response| async move {
        response.extensions_mut().insert(class);
        response
    }))
}

/// Class stamped on `response`, if its route was tagged.
pub fn tagged_class(response: &Response) -> Option<RouteClass> {
    response.extensions().get::<RouteClass>().copied()
}
