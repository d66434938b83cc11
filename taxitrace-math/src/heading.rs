use std::{fmt, ops};

use bevy_math::Vec2;


/// An absolute surface bearing in degrees, clockwise from north.
#[derive(Clone, Copy, PartialEq)]
pub struct Heading(
    f32, // always 0 <= degrees < 360
);

impl Heading {
    /// Heading north.
    pub const NORTH: Self = Self(0.);
    /// Heading east.
    pub const EAST: Self = Self(90.);
    /// Heading south.
    pub const SOUTH: Self = Self(180.);
    /// Heading west.
    pub const WEST: Self = Self(270.);

    /// Creates a heading from a bearing in degrees, normalizing into `0..360`.
    #[must_use]
    pub fn from_degrees(degrees: f32) -> Self { Self(degrees.rem_euclid(360.)) }

    /// Returns the bearing in degrees in the range `0..360`.
    #[must_use]
    pub fn degrees(self) -> f32 { self.0 }

    /// Returns the heading of a vector with x pointing east and y pointing north.
    ///
    /// The result is unspecified if the vector is zero or has NaN components.
    #[must_use]
    pub fn from_vec2(vec: Vec2) -> Self { Self::from_degrees(vec.x.atan2(vec.y).to_degrees()) }

    /// Converts the heading into a unit direction vector,
    /// with x pointing east and y pointing north.
    #[must_use]
    pub fn direction(self) -> Vec2 {
        let (sin, cos) = self.0.to_radians().sin_cos();
        Vec2::new(sin, cos)
    }

    /// Returns the signed angle in degrees closest to zero such that
    /// adding it to `self` returns `other`.
    ///
    /// The output is always in the range `-180.0 < output <= 180.0`;
    /// positive values are clockwise.
    #[must_use]
    pub fn closest_distance(self, other: Heading) -> f32 {
        let delta = (other.0 - self.0).rem_euclid(360.);
        if delta > 180. { delta - 360. } else { delta }
    }

    /// Blends two headings along the shorter arc between them.
    ///
    /// Interpolating between 359 and 1 degrees passes through 0,
    /// never sweeping the long way around through 180.
    #[must_use]
    pub fn lerp_shortest(self, other: Heading, s: f32) -> Self {
        let mut a = self.0;
        let mut b = other.0;
        // Unwrap whichever endpoint is more than half a turn behind the other.
        if a < b && a + 180. - b < 0. {
            a += 360.;
        }
        if b < a && b + 180. - a < 0. {
            b += 360.;
        }
        Self::from_degrees((1. - s) * a + s * b)
    }
}

impl fmt::Debug for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Heading({}\u{b0})", self.0)
    }
}

impl ops::Add<f32> for Heading {
    type Output = Self;

    fn add(self, rhs: f32) -> Self { Self::from_degrees(self.0 + rhs) }
}

impl ops::Sub<f32> for Heading {
    type Output = Self;

    fn sub(self, rhs: f32) -> Self { Self::from_degrees(self.0 - rhs) }
}
