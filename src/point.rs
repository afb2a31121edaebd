/// A coordinate in diagram space.
///
/// `x` is the cross axis (sibling order) and `y` is the primary axis (depth).
/// The [`TreeDiagram`](crate::TreeDiagram) widget swaps them on screen so the tree grows left to right.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation, `t == 0` is `self`, `t == 1` is `to`.
    #[must_use]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            x: (to.x - self.x).mul_add(t, self.x),
            y: (to.y - self.y).mul_add(t, self.y),
        }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[test]
fn lerp_hits_both_ends_and_the_middle() {
    let a = Point::new(0.0, 10.0);
    let b = Point::new(100.0, -10.0);
    assert_eq!(a.lerp(b, 0.0), a);
    assert_eq!(a.lerp(b, 1.0), b);
    assert_eq!(a.lerp(b, 0.5), Point::new(50.0, 0.0));
}

#[test]
fn distance_is_euclidean() {
    let distance = Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0));
    assert!((distance - 5.0).abs() < f64::EPSILON);
}
