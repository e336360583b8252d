//! Geometric primitives

/// A 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points in any order.
    pub fn from_points(p1: Point, p2: Point) -> Self {
        let x = p1.x.min(p2.x);
        let y = p1.y.min(p2.y);
        let width = (p2.x - p1.x).abs();
        let height = (p2.y - p1.y).abs();
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Intersection with another rect. `None` when the rects do not overlap.
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}

/// Corner radii for rounded rectangles, one per corner
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub const fn uniform(radius: f32) -> Self {
        Self {
            top_left: radius,
            top_right: radius,
            bottom_right: radius,
            bottom_left: radius,
        }
    }
}

/// A rectangle with independently rounded corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct RoundedRect {
    pub rect: Rect,
    pub corner_radius: CornerRadius,
}

impl RoundedRect {
    pub const fn new(rect: Rect, corner_radius: CornerRadius) -> Self {
        Self {
            rect,
            corner_radius,
        }
    }

    /// Containment test. Each corner carves out the region outside its
    /// quarter circle.
    pub fn contains(&self, point: Point) -> bool {
        if !self.rect.contains(point) {
            return false;
        }
        let r = &self.rect;
        let cr = &self.corner_radius;

        let corners = [
            (Point::new(r.x + cr.top_left, r.y + cr.top_left), cr.top_left),
            (
                Point::new(r.right() - cr.top_right, r.y + cr.top_right),
                cr.top_right,
            ),
            (
                Point::new(r.right() - cr.bottom_right, r.bottom() - cr.bottom_right),
                cr.bottom_right,
            ),
            (
                Point::new(r.x + cr.bottom_left, r.bottom() - cr.bottom_left),
                cr.bottom_left,
            ),
        ];

        // A point is outside only if it falls in a corner square beyond the
        // corner's circular arc.
        for (i, (center, radius)) in corners.iter().enumerate() {
            if *radius <= 0.0 {
                continue;
            }
            let in_corner_box = match i {
                0 => point.x < center.x && point.y < center.y,
                1 => point.x > center.x && point.y < center.y,
                2 => point.x > center.x && point.y > center.y,
                _ => point.x < center.x && point.y > center.y,
            };
            if in_corner_box {
                let dx = point.x - center.x;
                let dy = point.y - center.y;
                if dx * dx + dy * dy > radius * radius {
                    return false;
                }
            }
        }
        true
    }
}

/// An axis-aligned ellipse
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Ellipse {
    pub center: Point,
    pub radius_x: f32,
    pub radius_y: f32,
}

impl Ellipse {
    pub const fn new(center: Point, radius_x: f32, radius_y: f32) -> Self {
        Self {
            center,
            radius_x,
            radius_y,
        }
    }

    /// Circle helper.
    pub const fn circle(center: Point, radius: f32) -> Self {
        Self::new(center, radius, radius)
    }

    pub fn contains(&self, point: Point) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let nx = (point.x - self.center.x) / self.radius_x;
        let ny = (point.y - self.center.y) / self.radius_y;
        nx * nx + ny * ny <= 1.0
    }
}
