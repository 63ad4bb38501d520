//! GPX route parsing.
//!
//! Reads the first segment of the first track. Files exported from route
//! planners sometimes only carry a `<rte>`, so the first route is used when
//! there is no track.

use crate::error::{Result, RoutePoiError};
use crate::GpsPoint;
use log::{debug, warn};
use std::io::Read;

/// Parse a GPX document into route samples in traversal order.
///
/// Points with out-of-range coordinates are dropped.
pub fn parse_route<R: Read>(reader: R) -> Result<Vec<GpsPoint>> {
    let doc = ::gpx::read(reader).map_err(|e| RoutePoiError::GpxParse {
        message: e.to_string(),
    })?;

    let waypoints = if let Some(segment) = doc.tracks.first().and_then(|t| t.segments.first()) {
        &segment.points
    } else if let Some(route) = doc.routes.first() {
        debug!("[GpxRoute] No track segment, using route '{:?}'", route.name);
        &route.points
    } else {
        return Err(RoutePoiError::GpxParse {
            message: "document has no track segment or route".to_string(),
        });
    };

    let total = waypoints.len();
    let points: Vec<GpsPoint> = waypoints
        .iter()
        .map(|wp| {
            let p = wp.point();
            GpsPoint::new(p.y(), p.x())
        })
        .filter(|p| p.is_valid())
        .collect();

    if points.len() < total {
        warn!("[GpxRoute] Dropped {} points with invalid coordinates", total - points.len());
    }

    if points.is_empty() {
        return Err(RoutePoiError::EmptyRoute);
    }

    debug!("[GpxRoute] Parsed {} route samples", points.len());
    Ok(points)
}

/// Parse GPX from an in-memory buffer (e.g. an uploaded file).
pub fn parse_route_bytes(bytes: &[u8]) -> Result<Vec<GpsPoint>> {
    parse_route(std::io::Cursor::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Gauja loop</name>
    <trkseg>
      <trkpt lat="57.3110" lon="25.2700"></trkpt>
      <trkpt lat="57.3120" lon="25.2710"></trkpt>
      <trkpt lat="57.3130" lon="25.2725"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="58.0000" lon="26.0000"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    const ROUTE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <rte>
    <name>Planned</name>
    <rtept lat="56.9500" lon="24.1000"></rtept>
    <rtept lat="56.9510" lon="24.1020"></rtept>
  </rte>
</gpx>"#;

    const EMPTY_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
</gpx>"#;

    #[test]
    fn test_parse_first_track_segment() {
        let points = parse_route_bytes(TRACK_GPX.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], GpsPoint::new(57.3110, 25.2700));
        assert_eq!(points[2], GpsPoint::new(57.3130, 25.2725));
    }

    #[test]
    fn test_parse_route_fallback() {
        let points = parse_route_bytes(ROUTE_GPX.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], GpsPoint::new(56.9510, 24.1020));
    }

    #[test]
    fn test_parse_without_geometry() {
        assert!(matches!(
            parse_route_bytes(EMPTY_GPX.as_bytes()),
            Err(RoutePoiError::GpxParse { .. })
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_route_bytes(b"<gpx><trk>"),
            Err(RoutePoiError::GpxParse { .. })
        ));
    }
}
