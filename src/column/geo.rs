/// Geo column types are wrappers around existing column types
/// - Point: Tuple(Float64, Float64)
/// - Ring: Array(Point)
/// - Polygon: Array(Ring)
/// - MultiPolygon: Array(Polygon)
///
/// These types use the existing ColumnTuple and ColumnArray
/// implementations with specific type constraints. No separate column
/// implementation is needed.
use crate::types::Type;

/// Helper to create a Point type (Tuple(Float64, Float64))
pub fn point_type() -> Type {
    Type::point()
}

/// Helper to create a Ring type (Array(Point))
pub fn ring_type() -> Type {
    Type::ring()
}

/// Helper to create a Polygon type (Array(Ring))
pub fn polygon_type() -> Type {
    Type::polygon()
}

/// Helper to create a MultiPolygon type (Array(Polygon))
pub fn multi_polygon_type() -> Type {
    Type::multi_polygon()
}
