use num::Num;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point<T: Num> {
    pub x: T,
    pub y: T,
}

/// Axis-aligned box anchored at its top-left corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox<T: Num> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T: Num + Copy> BoundingBox<T> {
    pub fn top_left(&self) -> Point<T> {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    pub fn bottom_right(&self) -> Point<T> {
        Point {
            x: self.x + self.width,
            y: self.y + self.height,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClickKind {
    Remove = 0,
    Add = 1,
}

impl ClickKind {
    pub fn label(self) -> f32 {
        self as i32 as f32
    }
}

/// A point prompt in source-image pixel space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClickPoint {
    pub x: f32,
    pub y: f32,
    pub kind: ClickKind,
}

impl ClickPoint {
    pub fn new(x: f32, y: f32, kind: ClickKind) -> Self {
        Self { x, y, kind }
    }

    pub fn add(x: f32, y: f32) -> Self {
        Self::new(x, y, ClickKind::Add)
    }

    pub fn remove(x: f32, y: f32) -> Self {
        Self::new(x, y, ClickKind::Remove)
    }
}
