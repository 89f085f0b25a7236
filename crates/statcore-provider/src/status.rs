use statcore_core::CoreError;

/// Maps the identity provider's status codes to the core error taxonomy
/// (§6): `200` is handled by the caller; `404`/`204` is "not found";
/// `429`/`503`/`504` is "temporarily unavailable"; anything else non-2xx is
/// `Internal`.
pub(crate) fn map_identity_status(status: reqwest::StatusCode) -> CoreError {
    match status.as_u16() {
        404 | 204 => CoreError::NotFound,
        429 | 503 | 504 => CoreError::TemporarilyUnavailable,
        _ => CoreError::internal(anyhow::anyhow!("identity provider returned {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn not_found_statuses() {
        assert!(matches!(
            map_identity_status(StatusCode::NOT_FOUND),
            CoreError::NotFound
        ));
        assert!(matches!(
            map_identity_status(StatusCode::NO_CONTENT),
            CoreError::NotFound
        ));
    }

    #[test]
    fn temporarily_unavailable_statuses() {
        assert!(matches!(
            map_identity_status(StatusCode::TOO_MANY_REQUESTS),
            CoreError::TemporarilyUnavailable
        ));
        assert!(matches!(
            map_identity_status(StatusCode::SERVICE_UNAVAILABLE),
            CoreError::TemporarilyUnavailable
        ));
        assert!(matches!(
            map_identity_status(StatusCode::GATEWAY_TIMEOUT),
            CoreError::TemporarilyUnavailable
        ));
    }

    #[test]
    fn other_non_2xx_is_internal() {
        assert!(matches!(
            map_identity_status(StatusCode::INTERNAL_SERVER_ERROR),
            CoreError::Internal(_)
        ));
    }
}
