use crate::config::ConfigError;
use crate::deltas::DeltaError;
use crate::notifications::NotificationError;
use crate::snapshots::SnapshotError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Snapshot(SnapshotError),
    Delta(DeltaError),
    Notification(NotificationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Snapshot(err) => write!(f, "snapshot error: {}", err),
            AppError::Delta(err) => write!(f, "delta error: {}", err),
            AppError::Notification(err) => write!(f, "notification error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Delta(err) => Some(err),
            AppError::Notification(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Delta(DeltaError::NoSnapshots) => StatusCode::NOT_FOUND,
            AppError::Delta(_) => StatusCode::BAD_REQUEST,
            AppError::Snapshot(
                SnapshotError::Csv(_) | SnapshotError::MissingColumn { .. },
            ) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Snapshot(_)
            | AppError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SnapshotError> for AppError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<DeltaError> for AppError {
    fn from(value: DeltaError) -> Self {
        Self::Delta(value)
    }
}

impl From<NotificationError> for AppError {
    fn from(value: NotificationError) -> Self {
        Self::Notification(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn client_errors_map_to_bad_request() {
        let missing = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");
        assert_eq!(
            AppError::from(DeltaError::MissingSnapshot(missing)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(SnapshotError::MissingColumn { column: "points" }).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(DeltaError::NoSnapshots).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn server_errors_map_to_internal_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let error = AppError::from(io);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "io error: disk gone");
    }
}
