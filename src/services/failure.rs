use crate::{
    cache::Fingerprint,
    error::{AppError, UpstreamError},
    services::routing::RouteFamily,
};

/// Converts a final upstream failure into the error returned to the caller
///
/// Logs the route and fingerprint so the failure can be traced server-side;
/// the caller only sees the stable code and message.
pub fn translate_upstream(err: UpstreamError, family: RouteFamily, fingerprint: &Fingerprint) -> AppError {
    let app_error = AppError::from(err);
    let (status, code) = app_error.status_and_code();

    if let AppError::Upstream(UpstreamError::Status { body, .. }) = &app_error {
        tracing::error!(
            route = %family,
            fingerprint = %fingerprint,
            status = status.as_u16(),
            code = code,
            upstream_body = %body,
            "Failed to fetch from TMDB"
        );
    } else {
        tracing::error!(
            route = %family,
            fingerprint = %fingerprint,
            status = status.as_u16(),
            code = code,
            error = %app_error,
            "Failed to fetch from TMDB"
        );
    }

    app_error
}

/// Logs a request rejected before any upstream call
pub fn log_rejected(err: &AppError, family: RouteFamily) {
    tracing::warn!(route = %family, error = %err, "Rejected proxy request");
}
