// Copyright 2016 The Cartographer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::errors::*;

/// A point in (up to) three dimensions. `z` is unused when a `Structure` is
/// configured for `dimensions() == 2`, but is always present so the same
/// type works for both tree shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point { x, y, z }
    }

    /// The sentinel "does-not-exist" point: any component NaN.
    pub fn non_existent() -> Self {
        Point {
            x: f64::NAN,
            y: f64::NAN,
            z: f64::NAN,
        }
    }

    pub fn exists(&self) -> bool {
        !self.x.is_nan() && !self.y.is_nan() && !self.z.is_nan()
    }
}

/// An axis-aligned bounding box, plus a cached midpoint so `mid()` is O(1)
/// on the hot descent path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    min: Point,
    max: Point,
    mid: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        let mid = Point::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        );
        BBox { min, max, mid }
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn mid(&self) -> Point {
        self.mid
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn overlaps(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn area(&self) -> f64 {
        let dx = self.max.x - self.min.x;
        let dy = self.max.y - self.min.y;
        let dz = self.max.z - self.min.z;
        if dz == 0.0 {
            dx * dy
        } else {
            dx * dy * dz
        }
    }

    pub fn grow_by(&self, eps: f64) -> BBox {
        BBox::new(
            Point::new(self.min.x - eps, self.min.y - eps, self.min.z - eps),
            Point::new(self.max.x + eps, self.max.y + eps, self.max.z + eps),
        )
    }

    /// Splits this box into `factor` octants (or quadrants, in 2D), indexed
    /// by the same bit pattern `Climber::magnify` computes: bit 0 = east,
    /// bit 1 = north, bit 2 = up (only consulted in 3D).
    pub fn octant(&self, dir: u64, dimensions: u32) -> BBox {
        let mid = self.mid();
        let east = dir & 1 != 0;
        let north = dir & 2 != 0;
        let up = dimensions == 3 && dir & 4 != 0;

        let min_x = if east { mid.x } else { self.min.x };
        let max_x = if east { self.max.x } else { mid.x };
        let min_y = if north { mid.y } else { self.min.y };
        let max_y = if north { self.max.y } else { mid.y };
        let (min_z, max_z) = if dimensions == 3 {
            if up {
                (mid.z, self.max.z)
            } else {
                (self.min.z, mid.z)
            }
        } else {
            (self.min.z, self.max.z)
        };

        BBox::new(
            Point::new(min_x, min_y, min_z),
            Point::new(max_x, max_y, max_z),
        )
    }

    /// The octant code of `p` relative to this box's midpoint: bit 0 = east,
    /// bit 1 = north, bit 2 = up (only in 3D). Returns `Error::OutOfBounds`
    /// if `p` does not lie inside this box.
    pub fn octant_of(&self, p: &Point, dimensions: u32) -> Result<u64> {
        if !self.contains(p) {
            return Err(ErrorKind::OutOfBounds.into());
        }
        let mid = self.mid();
        let mut dir = 0u64;
        if p.x > mid.x {
            dir |= 1;
        }
        if p.y > mid.y {
            dir |= 2;
        }
        if dimensions == 3 && p.z > mid.z {
            dir |= 4;
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> BBox {
        BBox::new(Point::new(0., 0., 0.), Point::new(1., 1., 1.))
    }

    #[test]
    fn mid_is_cached_center() {
        let bbox = unit_cube();
        assert_eq!(Point::new(0.5, 0.5, 0.5), bbox.mid());
    }

    #[test]
    fn contains_respects_bounds() {
        let bbox = unit_cube();
        assert!(bbox.contains(&Point::new(0.5, 0.5, 0.5)));
        assert!(!bbox.contains(&Point::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn overlaps_is_symmetric() {
        let a = unit_cube();
        let b = BBox::new(Point::new(0.5, 0.5, 0.5), Point::new(2., 2., 2.));
        let c = BBox::new(Point::new(2., 2., 2.), Point::new(3., 3., 3.));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn octant_of_agrees_with_octant_subdivision() {
        let bbox = unit_cube();
        for dir in 0..8u64 {
            let child = bbox.octant(dir, 3);
            let interior = child.mid();
            assert_eq!(dir, bbox.octant_of(&interior, 3).unwrap());
            assert!(child.contains(&interior));
        }
    }

    #[test]
    fn octant_of_out_of_bounds_errors() {
        let bbox = unit_cube();
        assert!(bbox.octant_of(&Point::new(-1., 0., 0.), 3).is_err());
    }

    #[test]
    fn two_dimensional_octant_ignores_z() {
        let bbox = unit_cube();
        let child = bbox.octant(0b011, 2);
        assert_eq!(0.5, child.min().x);
        assert_eq!(0.5, child.min().y);
        assert_eq!(0., child.min().z);
        assert_eq!(1., child.max().z);
    }
}
