/// Axis-aligned rectangle believed to bound a single face, in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from `[x1, y1, x2, y2]` corner coordinates.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1.round() as i32;
        let y = y1.round() as i32;
        Self {
            x,
            y,
            width: x2.round() as i32 - x,
            height: y2.round() as i32 - y,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Intersection of this region with a `frame_w` × `frame_h` frame.
    ///
    /// Returns `None` when nothing of the region is visible.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<Region> {
        let fw = frame_w.min(i32::MAX as u32) as i32;
        let fh = frame_h.min(i32::MAX as u32) as i32;
        let x1 = self.x.clamp(0, fw);
        let y1 = self.y.clamp(0, fh);
        let x2 = self.x.saturating_add(self.width).clamp(0, fw);
        let y2 = self.y.saturating_add(self.height).clamp(0, fh);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2 - x1, y2 - y1))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_corners_rounds() {
        let r = Region::from_corners(10.4, 20.6, 50.5, 80.2);
        assert_eq!(r, Region::new(10, 21, 41, 59));
    }

    #[test]
    fn test_area() {
        assert_eq!(Region::new(0, 0, 20, 30).area(), 600);
        assert_eq!(Region::new(0, 0, -5, 30).area(), 0);
    }

    #[rstest]
    #[case::inside(Region::new(10, 10, 20, 20), Some(Region::new(10, 10, 20, 20)))]
    #[case::left_edge(Region::new(-10, 0, 30, 20), Some(Region::new(0, 0, 20, 20)))]
    #[case::bottom_right(Region::new(90, 90, 30, 30), Some(Region::new(90, 90, 10, 10)))]
    #[case::outside(Region::new(200, 200, 10, 10), None)]
    #[case::zero_width(Region::new(10, 10, 0, 10), None)]
    fn test_clamp_to(#[case] region: Region, #[case] expected: Option<Region>) {
        assert_eq!(region.clamp_to(100, 100), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(Region::new(1, 2, 3, 4).to_string(), "3x4@(1,2)");
    }
}
