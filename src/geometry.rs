// src/geometry.rs
use geo::{BoundingRect, Centroid, Coord, Intersects, LineString, Point, Polygon, Rect};

use crate::error::{EeiError, Result};

/// Number of coordinate pairs in a region ring, closing vertex included
pub const REGION_VERTICES: usize = 5;

/// Point used both as bounds filter and as the EEI sample location
pub const LAKE_URMIA_POINT: [f64; 2] = [45.3, 37.7];

/// Lake Urmia bounding ring as (lon, lat) pairs
pub const LAKE_URMIA_RING: [[f64; 2]; REGION_VERTICES] = [
    [45.0, 37.4],
    [45.6, 37.4],
    [45.6, 37.8],
    [45.0, 37.8],
    [45.0, 37.4],
];

/// Closed polygon used to clip and reduce rasters
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    vertices: Vec<[f64; 2]>,
    polygon: Polygon<f64>,
}

impl Region {
    /// Validates the ring before building the polygon, since `geo` closes
    /// open rings silently.
    pub fn from_vertices(vertices: &[[f64; 2]]) -> Result<Self> {
        if vertices.len() != REGION_VERTICES {
            return Err(EeiError::InvalidGeometry(format!(
                "region must have {} coordinate pairs, got {}",
                REGION_VERTICES,
                vertices.len()
            )));
        }
        if vertices.first() != vertices.last() {
            return Err(EeiError::InvalidGeometry(
                "region ring is not closed".to_string(),
            ));
        }
        if vertices.iter().flatten().any(|v| !v.is_finite()) {
            return Err(EeiError::InvalidGeometry(
                "region has non-finite coordinates".to_string(),
            ));
        }

        let ring: Vec<Coord<f64>> = vertices
            .iter()
            .map(|[x, y]| Coord { x: *x, y: *y })
            .collect();
        let polygon = Polygon::new(LineString::from(ring), vec![]);

        Ok(Self {
            vertices: vertices.to_vec(),
            polygon,
        })
    }

    pub fn lake_urmia() -> Self {
        Self {
            vertices: LAKE_URMIA_RING.to_vec(),
            polygon: Polygon::new(
                LineString::from(
                    LAKE_URMIA_RING
                        .iter()
                        .map(|[x, y]| (*x, *y))
                        .collect::<Vec<_>>(),
                ),
                vec![],
            ),
        }
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn is_closed(&self) -> bool {
        self.vertices.first() == self.vertices.last()
    }

    /// Boundary points count as inside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygon.intersects(&Point::new(x, y))
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.polygon.bounding_rect()
    }

    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.polygon.centroid().map(|p| (p.x(), p.y()))
    }
}

/// True when a scene footprint touches the point
pub fn footprint_touches(footprint: &Rect<f64>, point: &Point<f64>) -> bool {
    footprint.intersects(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lake_urmia_ring_is_closed_with_five_pairs() {
        let region = Region::lake_urmia();
        assert_eq!(region.vertices().len(), 5);
        assert!(region.is_closed());
        assert_eq!(Region::from_vertices(&LAKE_URMIA_RING).unwrap(), region);
    }

    #[test]
    fn rejects_open_ring() {
        let open = [
            [45.0, 37.4],
            [45.6, 37.4],
            [45.6, 37.8],
            [45.0, 37.8],
            [45.1, 37.4],
        ];
        assert!(matches!(
            Region::from_vertices(&open),
            Err(EeiError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn rejects_wrong_vertex_count() {
        let triangle = [[45.0, 37.4], [45.6, 37.4], [45.3, 37.8], [45.0, 37.4]];
        assert!(Region::from_vertices(&triangle).is_err());
    }

    #[test]
    fn contains_interior_and_boundary() {
        let region = Region::lake_urmia();
        assert!(region.contains(45.3, 37.7));
        assert!(region.contains(45.0, 37.5));
        assert!(!region.contains(45.7, 37.5));
    }

    #[test]
    fn centroid_is_lake_centre() {
        let (x, y) = Region::lake_urmia().centroid().unwrap();
        assert!((x - 45.3).abs() < 1e-9);
        assert!((y - 37.6).abs() < 1e-9);
    }

    #[test]
    fn footprint_filter() {
        let footprint = Rect::new((45.0, 37.0), (46.0, 38.0));
        assert!(footprint_touches(&footprint, &Point::new(45.3, 37.7)));
        assert!(!footprint_touches(&footprint, &Point::new(44.0, 37.7)));
    }
}
