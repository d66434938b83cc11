use bevy_math::Vec2;

use crate::Heading;


/// An oriented bounding rectangle with independent fore and aft extents.
///
/// The rectangle is centered on a reference point and aligned with a
/// [`Heading`]; the fore extent reaches along the heading direction and the
/// aft extent reaches opposite to it, so the reference point need not be the
/// geometric center.
#[derive(Debug, Clone, Copy)]
pub struct Obb {
    vertices: [Vec2; 4],
    axes:     [Vec2; 2],
}

impl Obb {
    /// Builds the rectangle around `center`.
    ///
    /// `fore` and `aft` are the distances covered along and against the
    /// heading direction respectively; `half_width` is covered on each side.
    #[must_use]
    pub fn new(center: Vec2, heading: Heading, half_width: f32, fore: f32, aft: f32) -> Self {
        let long = heading.direction();
        let lat = long.perp();
        Self {
            vertices: [
                center + long * fore - lat * half_width,
                center + long * fore + lat * half_width,
                center - long * aft + lat * half_width,
                center - long * aft - lat * half_width,
            ],
            axes:     [long, lat],
        }
    }

    /// The corner points of the rectangle, in winding order.
    #[must_use]
    pub fn vertices(&self) -> [Vec2; 4] { self.vertices }

    fn projection(&self, axis: Vec2) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for vertex in self.vertices {
            let p = vertex.dot(axis);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    fn separated_along(&self, other: &Self, axis: Vec2) -> bool {
        let (min1, max1) = self.projection(axis);
        let (min2, max2) = other.projection(axis);
        max2 < min1 || min2 > max1
    }

    /// Whether the two rectangles overlap.
    ///
    /// Separating-axis test: two convex polygons are disjoint if and only if
    /// some axis perpendicular to one of their edges shows no overlap between
    /// their projections. Rectangles only contribute two distinct edge
    /// normals each, so four axes decide the intersection.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.axes
            .iter()
            .chain(other.axes.iter())
            .all(|&axis| !self.separated_along(other, axis))
    }
}
