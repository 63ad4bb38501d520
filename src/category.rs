//! POI categories: which OSM features to fetch and how they are shown.
//!
//! Each category owns the Overpass QL selectors used to query it and the
//! marker attributes handed to the presentation layer.

use crate::error::RoutePoiError;
use crate::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categories of points of interest that can be overlaid on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    /// Public drinking water taps and fountains
    DrinkingWater,
    /// Fuel stations
    Fuel,
    /// Convenience stores
    ConvenienceStore,
    /// Free huts and shelters run by RMK (Estonian State Forest Management Centre)
    RmkHut,
}

/// One Overpass tag filter, e.g. `["amenity"="fuel"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSelector {
    /// Concatenated tag filters
    pub filters: &'static str,
    /// Also query `way` elements (areas, buildings), not only nodes
    pub include_ways: bool,
}

/// Display attributes for a category's map markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    /// Font Awesome icon name
    pub icon: &'static str,
    pub color: &'static str,
}

const WATER_SELECTORS: &[TagSelector] = &[TagSelector {
    filters: r#"["amenity"="drinking_water"]"#,
    include_ways: true,
}];

const FUEL_SELECTORS: &[TagSelector] = &[TagSelector {
    filters: r#"["amenity"="fuel"]"#,
    include_ways: false,
}];

const STORE_SELECTORS: &[TagSelector] = &[TagSelector {
    filters: r#"["shop"="convenience"]"#,
    include_ways: true,
}];

const RMK_SELECTORS: &[TagSelector] = &[
    TagSelector {
        filters: r#"["tourism"="wilderness_hut"]["operator"="RMK"]["fee"!="yes"]"#,
        include_ways: true,
    },
    TagSelector {
        filters: r#"["tourism"="alpine_hut"]["operator"="RMK"]"#,
        include_ways: true,
    },
    TagSelector {
        filters: r#"["building"="hut"]["operator"="RMK"]"#,
        include_ways: true,
    },
    TagSelector {
        filters: r#"["building"="yes"]["operator"="RMK"]"#,
        include_ways: true,
    },
    TagSelector {
        filters: r#"["amenity"="shelter"]["operator"="RMK"]"#,
        include_ways: true,
    },
];

impl PoiCategory {
    pub const ALL: [PoiCategory; 4] = [
        PoiCategory::DrinkingWater,
        PoiCategory::Fuel,
        PoiCategory::ConvenienceStore,
        PoiCategory::RmkHut,
    ];

    /// Short key used on the command line and in logs.
    pub fn key(&self) -> &'static str {
        match self {
            PoiCategory::DrinkingWater => "water",
            PoiCategory::Fuel => "fuel",
            PoiCategory::ConvenienceStore => "store",
            PoiCategory::RmkHut => "rmk",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PoiCategory::DrinkingWater => "Drinking water",
            PoiCategory::Fuel => "Fuel station",
            PoiCategory::ConvenienceStore => "Convenience store",
            PoiCategory::RmkHut => "RMK huts",
        }
    }

    pub fn selectors(&self) -> &'static [TagSelector] {
        match self {
            PoiCategory::DrinkingWater => WATER_SELECTORS,
            PoiCategory::Fuel => FUEL_SELECTORS,
            PoiCategory::ConvenienceStore => STORE_SELECTORS,
            PoiCategory::RmkHut => RMK_SELECTORS,
        }
    }

    pub fn marker_style(&self) -> MarkerStyle {
        match self {
            PoiCategory::DrinkingWater => MarkerStyle {
                icon: "faucet-drip",
                color: "blue",
            },
            PoiCategory::Fuel => MarkerStyle {
                icon: "gas-pump",
                color: "orange",
            },
            PoiCategory::ConvenienceStore => MarkerStyle {
                icon: "cart-shopping",
                color: "beige",
            },
            PoiCategory::RmkHut => MarkerStyle {
                icon: "person-shelter",
                color: "green",
            },
        }
    }

    /// Overpass QL union statement for this category inside `bounds`.
    ///
    /// ```rust
    /// use route_poi::{Bounds, PoiCategory};
    ///
    /// let bounds = Bounds {
    ///     min_lat: 57.0,
    ///     max_lat: 57.5,
    ///     min_lng: 24.0,
    ///     max_lng: 24.5,
    /// };
    /// let ql = PoiCategory::Fuel.overpass_ql(&bounds, 60);
    /// assert!(ql.contains(r#"node["amenity"="fuel"](57,24,57.5,24.5);"#));
    /// assert!(!ql.contains("way["));
    /// ```
    pub fn overpass_ql(&self, bounds: &Bounds, timeout_secs: u32) -> String {
        let bbox = overpass_bbox(bounds);
        let mut ql = format!("[out:json][timeout:{}];\n(\n", timeout_secs);
        for selector in self.selectors() {
            ql.push_str(&format!("  node{}{};\n", selector.filters, bbox));
            if selector.include_ways {
                ql.push_str(&format!("  way{}{};\n", selector.filters, bbox));
            }
        }
        ql.push_str(");\nout body;");
        ql
    }
}

/// Overpass bounding-box filter `(south,west,north,east)`.
pub fn overpass_bbox(bounds: &Bounds) -> String {
    format!(
        "({},{},{},{})",
        bounds.min_lat, bounds.min_lng, bounds.max_lat, bounds.max_lng
    )
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PoiCategory {
    type Err = RoutePoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PoiCategory::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RoutePoiError::Config {
                message: format!(
                    "unknown POI category '{}' (expected one of water, fuel, store, rmk)",
                    s
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            min_lat: 58.1,
            max_lat: 58.4,
            min_lng: 26.5,
            max_lng: 26.9,
        }
    }

    #[test]
    fn test_bbox_order() {
        assert_eq!(overpass_bbox(&bounds()), "(58.1,26.5,58.4,26.9)");
    }

    #[test]
    fn test_water_query_has_nodes_and_ways() {
        let ql = PoiCategory::DrinkingWater.overpass_ql(&bounds(), 25);
        assert!(ql.starts_with("[out:json][timeout:25];"));
        assert!(ql.contains(r#"node["amenity"="drinking_water"](58.1,26.5,58.4,26.9);"#));
        assert!(ql.contains(r#"way["amenity"="drinking_water"](58.1,26.5,58.4,26.9);"#));
        assert!(ql.ends_with("out body;"));
    }

    #[test]
    fn test_rmk_query_covers_all_selectors() {
        let ql = PoiCategory::RmkHut.overpass_ql(&bounds(), 25);
        assert_eq!(ql.matches("node[").count(), RMK_SELECTORS.len());
        assert_eq!(ql.matches("way[").count(), RMK_SELECTORS.len());
        assert!(ql.contains(r#"["fee"!="yes"]"#));
    }

    #[test]
    fn test_parse_category() {
        assert_eq!("water".parse::<PoiCategory>().unwrap(), PoiCategory::DrinkingWater);
        assert_eq!(" RMK ".parse::<PoiCategory>().unwrap(), PoiCategory::RmkHut);
        assert!(matches!(
            "bakery".parse::<PoiCategory>(),
            Err(RoutePoiError::Config { .. })
        ));
        for c in PoiCategory::ALL {
            assert_eq!(c.to_string().parse::<PoiCategory>().unwrap(), c);
        }
    }

    #[test]
    fn test_marker_styles_are_distinct() {
        let icons: std::collections::HashSet<&str> =
            PoiCategory::ALL.iter().map(|c| c.marker_style().icon).collect();
        assert_eq!(icons.len(), PoiCategory::ALL.len());
    }
}
