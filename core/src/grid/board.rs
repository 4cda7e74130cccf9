use crate::grid::coordinates::Cell;

/// Margin, in cells, a snake must clear beyond every edge to count as gone.
pub const EXIT_MARGIN: isize = 1;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Board {
    rows: usize,
    cols: usize,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn area(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row() >= 0
            && cell.row() < self.rows as isize
            && cell.col() >= 0
            && cell.col() < self.cols as isize
    }

    pub fn is_beyond_margin(&self, cell: Cell) -> bool {
        cell.row() < -EXIT_MARGIN
            || cell.row() >= self.rows as isize + EXIT_MARGIN
            || cell.col() < -EXIT_MARGIN
            || cell.col() >= self.cols as isize + EXIT_MARGIN
    }

    pub fn offset(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.row() as usize * self.cols + cell.col() as usize)
        } else {
            None
        }
    }

    pub fn cell_at(&self, offset: usize) -> Cell {
        Cell::new((offset / self.cols) as isize, (offset % self.cols) as isize)
    }

    pub fn cells(self) -> impl Iterator<Item = Cell> {
        (0..self.area()).map(move |offset| self.cell_at(offset))
    }
}

#[test]
fn test_board_contains() {
    let board = Board::new(3, 2);
    assert!(board.contains(Cell::new(0, 0)));
    assert!(board.contains(Cell::new(2, 1)));
    assert!(!board.contains(Cell::new(3, 0)));
    assert!(!board.contains(Cell::new(0, 2)));
    assert!(!board.contains(Cell::new(-1, 0)));
}

#[test]
fn test_board_margin() {
    let board = Board::new(3, 3);
    assert!(!board.is_beyond_margin(Cell::new(1, 3)));
    assert!(board.is_beyond_margin(Cell::new(1, 4)));
    assert!(!board.is_beyond_margin(Cell::new(-1, 1)));
    assert!(board.is_beyond_margin(Cell::new(-2, 1)));
}

#[test]
fn test_board_offsets() {
    let board = Board::new(4, 3);
    assert_eq!(board.area(), 12);
    for (offset, cell) in board.cells().enumerate() {
        assert_eq!(board.offset(cell), Some(offset));
        assert_eq!(board.cell_at(offset), cell);
    }
    assert_eq!(board.offset(Cell::new(0, 3)), None);
}
