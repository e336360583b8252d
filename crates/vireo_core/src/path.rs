//! Path building, content hashing, and containment

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;

use crate::geometry::Point;

/// Path command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    Close,
}

/// A 2D path composed of commands
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: SmallVec<[PathCommand; 16]>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path from pre-built commands, used when reading path data back out
    /// of a frame buffer's arena.
    pub fn from_commands(commands: &[PathCommand]) -> Self {
        Self {
            commands: SmallVec::from_slice(commands),
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Hash over the path's command tags and coordinate bit patterns.
    ///
    /// Two paths built from the same commands hash identically, so the hash
    /// can key geometry caches across frames and across widgets that draw
    /// the same shape.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(p) => {
                    0u8.hash(&mut hasher);
                    hash_point(*p, &mut hasher);
                }
                PathCommand::LineTo(p) => {
                    1u8.hash(&mut hasher);
                    hash_point(*p, &mut hasher);
                }
                PathCommand::QuadTo { control, end } => {
                    2u8.hash(&mut hasher);
                    hash_point(*control, &mut hasher);
                    hash_point(*end, &mut hasher);
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    3u8.hash(&mut hasher);
                    hash_point(*control1, &mut hasher);
                    hash_point(*control2, &mut hasher);
                    hash_point(*end, &mut hasher);
                }
                PathCommand::Close => 4u8.hash(&mut hasher),
            }
        }
        hasher.finish()
    }

    /// Even-odd containment test treating the path as a set of closed
    /// polygons. Curve segments contribute their chords; subpaths are
    /// implicitly closed.
    pub fn contains(&self, point: Point) -> bool {
        let mut inside = false;
        let mut first = Point::ZERO;
        let mut current = Point::ZERO;
        let mut open = false;

        let mut toggle = |a: Point, b: Point| {
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
        };

        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(p) => {
                    if open {
                        toggle(current, first);
                    }
                    first = *p;
                    current = *p;
                    open = true;
                }
                PathCommand::LineTo(p) => {
                    toggle(current, *p);
                    current = *p;
                }
                PathCommand::QuadTo { end, .. } => {
                    toggle(current, *end);
                    current = *end;
                }
                PathCommand::CubicTo { end, .. } => {
                    toggle(current, *end);
                    current = *end;
                }
                PathCommand::Close => {
                    if open {
                        toggle(current, first);
                        current = first;
                        open = false;
                    }
                }
            }
        }
        if open {
            toggle(current, first);
        }
        inside
    }
}

/// Builder for constructing paths
pub struct PathBuilder {
    path: Path,
    current: Point,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            path: Path::new(),
            current: Point::ZERO,
        }
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        let point = Point::new(x, y);
        self.path.commands.push(PathCommand::MoveTo(point));
        self.current = point;
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        let point = Point::new(x, y);
        self.path.commands.push(PathCommand::LineTo(point));
        self.current = point;
        self
    }

    /// Line segment relative to the current point.
    pub fn line_by(self, dx: f32, dy: f32) -> Self {
        let (x, y) = (self.current.x + dx, self.current.y + dy);
        self.line_to(x, y)
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        let end = Point::new(x, y);
        self.path.commands.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            end,
        });
        self.current = end;
        self
    }

    pub fn cubic_to(mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Self {
        let end = Point::new(x, y);
        self.path.commands.push(PathCommand::CubicTo {
            control1: Point::new(c1x, c1y),
            control2: Point::new(c2x, c2y),
            end,
        });
        self.current = end;
        self
    }

    pub fn close(mut self) -> Self {
        self.path.commands.push(PathCommand::Close);
        self
    }

    pub fn build(self) -> Path {
        self.path
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_point(p: Point, hasher: &mut FxHasher) {
    p.x.to_bits().hash(hasher);
    p.y.to_bits().hash(hasher);
}
