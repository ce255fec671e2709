use serde::{Deserialize, Serialize};

/// Axis-aligned extent of a point set. Only ever derived from a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// `None` for an empty point set; a zero box would be indistinguishable
    /// from a legitimately tiny part.
    pub fn from_points(points: &[[f64; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some(Self { min, max })
    }

    /// Midpoint of the per-axis extremes.
    pub fn center(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| (self.min[i] + self.max[i]) / 2.0)
    }

    /// Per-axis `max - min`.
    pub fn size(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| self.max[i] - self.min[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_has_zero_size() {
        let b = BoundingBox::from_points(&[[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(b.size(), [0.0; 3]);
        assert_eq!(b.center(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_has_no_box() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn negative_extent() {
        let b = BoundingBox::from_points(&[[-2.0, 0.0, 0.0], [2.0, -1.0, 4.0]]).unwrap();
        assert_eq!(b.min, [-2.0, -1.0, 0.0]);
        assert_eq!(b.max, [2.0, 0.0, 4.0]);
        assert_eq!(b.center(), [0.0, -0.5, 2.0]);
    }
}
