use crate::grid::coordinates::Cell;
use std::f64::consts::PI;

pub const NUM_HEADINGS: usize = 4;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

pub const HEADINGS: [Heading; NUM_HEADINGS] =
    [Heading::Up, Heading::Down, Heading::Left, Heading::Right];

impl Heading {
    pub fn delta(self) -> Cell {
        match self {
            Heading::Up => Cell::new(-1, 0),
            Heading::Down => Cell::new(1, 0),
            Heading::Left => Cell::new(0, -1),
            Heading::Right => Cell::new(0, 1),
        }
    }

    /// Screen angle in radians, rows growing downwards.
    pub fn angle(self) -> f64 {
        match self {
            Heading::Up => -PI / 2.0,
            Heading::Down => PI / 2.0,
            Heading::Left => PI,
            Heading::Right => 0.0,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
            Heading::Up => Heading::Right,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Heading::Right => Heading::Up,
            Heading::Up => Heading::Left,
            Heading::Left => Heading::Down,
            Heading::Down => Heading::Right,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    pub fn perpendiculars(self) -> [Self; 2] {
        [self.clockwise(), self.counter_clockwise()]
    }

    /// Heading of the step leading from `from` to `to`, if they are adjacent.
    pub fn between(from: Cell, to: Cell) -> Option<Self> {
        let delta = to - from;
        HEADINGS.iter().copied().find(|h| h.delta() == delta)
    }
}

impl Default for Heading {
    fn default() -> Self {
        Heading::Right
    }
}

#[test]
fn test_heading_deltas_are_unit_steps() {
    for heading in HEADINGS.iter() {
        assert_eq!(heading.delta().distance(Cell::default()), 1);
    }
}

#[test]
fn test_heading_rotations() {
    for heading in HEADINGS.iter().copied() {
        assert_eq!(heading.clockwise().counter_clockwise(), heading);
        assert_eq!(heading.clockwise().clockwise(), heading.opposite());
        assert_eq!(heading.opposite().opposite(), heading);
        assert_eq!(heading.delta() + heading.opposite().delta(), Cell::default());
    }
    assert_eq!(Heading::Right.clockwise(), Heading::Down);
    assert_eq!(Heading::Left.counter_clockwise(), Heading::Down);
}

#[test]
fn test_heading_angles() {
    assert_eq!(Heading::Right.angle(), 0.0);
    assert_eq!(Heading::Left.angle(), PI);
    assert_eq!(Heading::Up.angle(), -Heading::Down.angle());
}

#[test]
fn test_heading_between() {
    let cell = Cell::new(3, 3);
    for heading in HEADINGS.iter().copied() {
        assert_eq!(Heading::between(cell, cell.neighbor(heading)), Some(heading));
    }
    assert_eq!(Heading::between(cell, Cell::new(4, 4)), None);
    assert_eq!(Heading::between(cell, cell), None);
}
