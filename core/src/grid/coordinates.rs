use crate::{grid::heading::Heading, vector::Vector2ISize};
use std::{fmt, ops::Mul};

#[derive(
    Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, AddAssign, Sub, SubAssign,
)]
pub struct Cell(Vector2ISize);

impl Cell {
    pub fn new(row: isize, col: isize) -> Self {
        Self(Vector2ISize { x: row, y: col })
    }

    pub fn row(&self) -> isize {
        self.0.x
    }

    pub fn col(&self) -> isize {
        self.0.y
    }

    pub fn neighbor(self, heading: Heading) -> Self {
        self + heading.delta()
    }

    pub fn ray(self, heading: Heading, distance: usize) -> Self {
        self + heading.delta() * distance as isize
    }

    pub fn distance(self, other: Self) -> isize {
        let vector = self - other;
        isize::abs(vector.row()) + isize::abs(vector.col())
    }

    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }
}

impl Mul<isize> for Cell {
    type Output = Self;

    fn mul(self, rhs: isize) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row(), self.col())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row(), self.col())
    }
}

impl From<(isize, isize)> for Cell {
    fn from((row, col): (isize, isize)) -> Self {
        Self::new(row, col)
    }
}

#[test]
fn test_new_cell() {
    assert_eq!(Cell::new(1, -3), Cell(Vector2ISize { x: 1, y: -3 }));
}

#[test]
fn test_cell_row_and_col() {
    let cell = Cell::new(4, -2);
    assert_eq!(cell.row(), 4);
    assert_eq!(cell.col(), -2);
}

#[test]
fn test_cell_neighbor() {
    let cell = Cell::new(1, 1);
    assert_eq!(cell.neighbor(Heading::Up), Cell::new(0, 1));
    assert_eq!(cell.neighbor(Heading::Down), Cell::new(2, 1));
    assert_eq!(cell.neighbor(Heading::Left), Cell::new(1, 0));
    assert_eq!(cell.neighbor(Heading::Right), Cell::new(1, 2));
}

#[test]
fn test_cell_ray() {
    assert_eq!(Cell::new(1, 1).ray(Heading::Right, 3), Cell::new(1, 4));
    assert_eq!(Cell::new(1, 1).ray(Heading::Up, 0), Cell::new(1, 1));
}

#[test]
fn test_cell_distance_and_adjacency() {
    let a = Cell::new(1, -3);
    let b = Cell::new(-2, 5);
    assert_eq!(a.distance(b), 11);
    assert_eq!(b.distance(a), 11);
    assert!(a.is_adjacent(Cell::new(1, -2)));
    assert!(!a.is_adjacent(Cell::new(2, -2)));
    assert!(!a.is_adjacent(a));
}
