//! Unified error handling for the route-poi library.
//!
//! Matching itself never fails: empty routes and unresolved candidates are
//! handled by skipping. Errors come from the collaborators (GPX input, the
//! Overpass API) and surface through this type.

use std::fmt;

/// Unified error type for route-poi operations.
#[derive(Debug, Clone)]
pub enum RoutePoiError {
    /// GPX document could not be read
    GpxParse { message: String },
    /// Route has no usable samples
    EmptyRoute,
    /// A way element could not be reduced to a single coordinate
    WayResolution { way_id: i64, message: String },
    /// HTTP/API error
    Http {
        message: String,
        status_code: Option<u16>,
    },
    /// Response body did not have the expected shape
    InvalidResponse { message: String },
    /// Configuration error
    Config { message: String },
}

impl fmt::Display for RoutePoiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePoiError::GpxParse { message } => {
                write!(f, "Failed to parse GPX: {}", message)
            }
            RoutePoiError::EmptyRoute => write!(f, "Route has no valid samples"),
            RoutePoiError::WayResolution { way_id, message } => {
                write!(f, "Could not resolve way {}: {}", way_id, message)
            }
            RoutePoiError::Http {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error ({}): {}", code, message)
                } else {
                    write!(f, "HTTP error: {}", message)
                }
            }
            RoutePoiError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            RoutePoiError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for RoutePoiError {}

/// Result type alias for route-poi operations.
pub type Result<T> = std::result::Result<T, RoutePoiError>;

/// Extension trait for converting Option to RoutePoiError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a way resolution error.
    fn ok_or_unresolved(self, way_id: i64, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unresolved(self, way_id: i64, message: &str) -> Result<T> {
        self.ok_or_else(|| RoutePoiError::WayResolution {
            way_id,
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RoutePoiError::WayResolution {
            way_id: 244704262,
            message: "way has no nodes".to_string(),
        };
        assert!(err.to_string().contains("244704262"));
        assert!(err.to_string().contains("no nodes"));

        let err = RoutePoiError::Http {
            message: "Too Many Requests".to_string(),
            status_code: Some(429),
        };
        assert_eq!(err.to_string(), "HTTP error (429): Too Many Requests");
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        assert!(matches!(
            none.ok_or_unresolved(7, "empty"),
            Err(RoutePoiError::WayResolution { way_id: 7, .. })
        ));

        assert_eq!(Some(3).ok_or_unresolved(7, "empty").unwrap(), 3);
    }
}
