use crate::{
    grid::{board::Board, coordinates::Cell},
    snake::Snake,
};

/// Dense per-cell storage over a board. Off-board positions are never stored.
#[derive(Debug, Clone)]
pub struct BoardStorage<H> {
    board: Board,
    cells: Vec<Option<H>>,
    len: usize,
}

impl<H> BoardStorage<H> {
    pub fn new(board: Board) -> Self {
        let mut cells = Vec::with_capacity(board.area());
        cells.resize_with(board.area(), || None);
        Self {
            board,
            cells,
            len: 0,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn get(&self, position: Cell) -> Option<&H> {
        self.board
            .offset(position)
            .and_then(|offset| self.cells[offset].as_ref())
    }

    pub fn contains_position(&self, position: Cell) -> bool {
        self.get(position).is_some()
    }

    pub fn insert(&mut self, position: Cell, value: H) -> Option<H> {
        let offset = self.board.offset(position)?;
        let old = self.cells[offset].replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Owner of every on-board cell, as an index into the snake slice it was built from.
pub type Occupancy = BoardStorage<usize>;

impl Occupancy {
    pub fn from_snakes(board: Board, snakes: &[Snake]) -> Self {
        let mut occupancy = Self::new(board);
        for (index, snake) in snakes.iter().enumerate() {
            occupancy.occupy(index, snake);
        }
        occupancy
    }

    pub fn occupy(&mut self, index: usize, snake: &Snake) {
        for cell in snake.body() {
            self.insert(*cell, index);
        }
    }

    pub fn owner(&self, position: Cell) -> Option<usize> {
        self.get(position).copied()
    }

    pub fn coverage(&self) -> f64 {
        if self.board.area() == 0 {
            0.0
        } else {
            self.len as f64 / self.board.area() as f64
        }
    }
}

#[test]
fn test_board_storage_should_give_access_to_values() {
    let mut storage = BoardStorage::new(Board::new(4, 6));
    storage.insert(Cell::new(3, 5), 42);
    assert_eq!(storage.get(Cell::new(3, 5)), Some(&42));
    assert_eq!(storage.get(Cell::new(0, 0)), None);
    assert_eq!(storage.insert(Cell::new(3, 5), 12), Some(42));
    assert_eq!(storage.get(Cell::new(3, 5)), Some(&12));
    assert_eq!(storage.len(), 1);
}

#[test]
fn test_board_storage_ignores_off_board_positions() {
    let mut storage = BoardStorage::new(Board::new(2, 2));
    assert_eq!(storage.insert(Cell::new(-1, 0), 1), None);
    assert_eq!(storage.insert(Cell::new(0, 2), 1), None);
    assert!(storage.is_empty());
    assert!(!storage.contains_position(Cell::new(-1, 0)));
}

#[test]
fn test_board_storage_counts_overwrites_once() {
    let mut storage = BoardStorage::new(Board::new(8, 8));
    // Write and sometimes overwrite values
    for (row, col, value) in [(3, 5, 93), (7, 7, 12), (3, 5, 42), (0, 0, 1)].iter() {
        storage.insert(Cell::new(*row, *col), *value);
    }
    assert_eq!(storage.len(), 3);
    assert_eq!(storage.get(Cell::new(3, 5)), Some(&42));
    assert_eq!(storage.get(Cell::new(7, 7)), Some(&12));
}

#[test]
fn test_occupancy_tracks_owners() {
    use crate::grid::heading::Heading;

    let board = Board::new(3, 3);
    let snakes = vec![
        Snake::build(0, &[(0, 0), (0, 1)], Heading::Left),
        Snake::build(1, &[(2, 2), (1, 2)], Heading::Down),
    ];
    let occupancy = Occupancy::from_snakes(board, &snakes);
    assert_eq!(occupancy.owner(Cell::new(0, 1)), Some(0));
    assert_eq!(occupancy.owner(Cell::new(2, 2)), Some(1));
    assert_eq!(occupancy.owner(Cell::new(1, 1)), None);
    assert_eq!(occupancy.len(), 4);
    assert!((occupancy.coverage() - 4.0 / 9.0).abs() < 1e-9);
}
