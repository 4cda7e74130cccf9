use crate::{
    color::Color,
    grid::{board::Board, coordinates::Cell, heading::Heading, storage::Occupancy},
};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(
    Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, From, Into, Display,
)]
#[display(fmt = "#{}", _0)]
pub struct SnakeId(pub usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnakeError {
    #[error("a snake needs at least one cell")]
    Empty,
    #[error("cells {0:?} and {1:?} are not one orthogonal step apart")]
    Disjoint(Cell, Cell),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    id: SnakeId,
    body: VecDeque<Cell>,
    heading: Heading,
    color: Color,
}

impl Snake {
    /// Builds a snake from head-first cells. The heading points from the second cell to the
    /// head, or right for a single-cell snake.
    pub fn new(id: SnakeId, body: Vec<Cell>, color: Color) -> Result<Self, SnakeError> {
        if body.is_empty() {
            return Err(SnakeError::Empty);
        }
        for pair in body.windows(2) {
            if !pair[0].is_adjacent(pair[1]) {
                return Err(SnakeError::Disjoint(pair[0], pair[1]));
            }
        }
        let heading = if body.len() >= 2 {
            Heading::between(body[1], body[0]).unwrap_or_default()
        } else {
            Heading::default()
        };
        Ok(Self {
            id,
            body: body.into(),
            heading,
            color,
        })
    }

    pub fn with_heading(mut self, heading: Heading) -> Self {
        self.heading = heading;
        self
    }

    pub fn id(&self) -> SnakeId {
        self.id
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn head(&self) -> Cell {
        *self.body.front().expect("snake body is never empty")
    }

    pub fn tail(&self) -> Cell {
        *self.body.back().expect("snake body is never empty")
    }

    pub fn next_head(&self) -> Cell {
        self.head().neighbor(self.heading)
    }

    pub fn segment_index(&self, cell: Cell) -> Option<usize> {
        self.body.iter().position(|c| *c == cell)
    }

    pub fn has_head_on_board(&self, board: &Board) -> bool {
        board.contains(self.head())
    }

    /// `occupied` holds every snake cell on the board. The own tail is accepted since it is
    /// vacated by the very same move.
    pub fn can_advance(&self, board: &Board, occupied: &Occupancy) -> bool {
        let next = self.next_head();
        !board.contains(next) || !occupied.contains_position(next) || next == self.tail()
    }

    /// Moves one cell along the current heading without any legality check.
    pub fn advance(&mut self) {
        let next = self.next_head();
        self.body.push_front(next);
        self.body.pop_back();
    }

    /// Checks the current head against every other snake and against the own body, tail
    /// excepted. Heads outside the board never collide.
    pub fn has_collided_with(&self, board: &Board, snakes: &[Snake]) -> bool {
        let head = self.head();
        if !board.contains(head) {
            return false;
        }
        let hits_other = snakes
            .iter()
            .filter(|other| other.id != self.id)
            .any(|other| other.body.iter().any(|c| *c == head));
        let last = self.body.len().saturating_sub(1);
        let hits_self = self
            .body
            .iter()
            .enumerate()
            .any(|(index, c)| index > 0 && index < last && *c == head);
        hits_other || hits_self
    }

    pub fn is_fully_off_board(&self, board: &Board) -> bool {
        self.body.iter().all(|c| board.is_beyond_margin(*c))
    }

    /// Finds the on-board snake this one faces: each next head is the other's current head.
    pub fn head_to_head_target<'a>(&self, board: &Board, snakes: &'a [Snake]) -> Option<&'a Snake> {
        let head = self.head();
        if !board.contains(head) {
            return None;
        }
        let next = self.next_head();
        snakes.iter().find(|other| {
            other.id != self.id
                && board.contains(other.head())
                && other.head() == next
                && other.next_head() == head
        })
    }

    /// In a face-off the later snake gives way.
    pub fn yields_to(&self, other: &Snake) -> bool {
        self.id > other.id
    }
}

#[cfg(test)]
impl Snake {
    pub(crate) fn build(id: usize, cells: &[(isize, isize)], heading: Heading) -> Self {
        Self::new(
            SnakeId(id),
            cells.iter().copied().map(Cell::from).collect(),
            Color::default(),
        )
        .expect("valid test snake")
        .with_heading(heading)
    }
}

#[cfg(test)]
fn is_contiguous(snake: &Snake) -> bool {
    snake
        .body()
        .iter()
        .zip(snake.body().iter().skip(1))
        .all(|(a, b)| a.is_adjacent(*b))
}

#[test]
fn test_new_snake_derives_heading_from_neck() {
    let snake = Snake::new(
        SnakeId(3),
        vec![Cell::new(1, 1), Cell::new(2, 1), Cell::new(2, 2)],
        Color::Blue,
    )
    .unwrap();
    assert_eq!(snake.heading(), Heading::Up);
    assert_eq!(snake.head(), Cell::new(1, 1));
    assert_eq!(snake.tail(), Cell::new(2, 2));
    assert_eq!(snake.len(), 3);
    assert_eq!(snake.color(), Color::Blue);
    assert_eq!(snake.id(), SnakeId(3));
}

#[test]
fn test_new_single_cell_snake_heads_right() {
    let snake = Snake::new(SnakeId(0), vec![Cell::new(0, 0)], Color::Red).unwrap();
    assert_eq!(snake.heading(), Heading::Right);
    assert_eq!(snake.head(), snake.tail());
}

#[test]
fn test_new_snake_rejects_invalid_bodies() {
    assert_eq!(
        Snake::new(SnakeId(0), vec![], Color::Red),
        Err(SnakeError::Empty)
    );
    assert_eq!(
        Snake::new(
            SnakeId(0),
            vec![Cell::new(0, 0), Cell::new(1, 1)],
            Color::Red
        ),
        Err(SnakeError::Disjoint(Cell::new(0, 0), Cell::new(1, 1)))
    );
    assert!(Snake::new(
        SnakeId(0),
        vec![Cell::new(0, 0), Cell::new(0, 2)],
        Color::Red
    )
    .is_err());
}

#[test]
fn test_advance_keeps_length_contiguity_and_heading() {
    use crate::grid::heading::HEADINGS;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let length = rng.gen_range(1, 12);
        let mut cells = vec![Cell::new(rng.gen_range(-5, 5), rng.gen_range(-5, 5))];
        while cells.len() < length {
            let last = *cells.last().unwrap();
            cells.push(last.neighbor(*HEADINGS.choose(&mut rng).unwrap()));
        }
        let heading = *HEADINGS.choose(&mut rng).unwrap();
        let mut snake = Snake::new(SnakeId(0), cells, Color::Red)
            .unwrap()
            .with_heading(heading);
        for _ in 0..rng.gen_range(1, 20) {
            let next = snake.next_head();
            snake.advance();
            assert_eq!(snake.head(), next);
            assert_eq!(snake.len(), length);
            assert_eq!(snake.heading(), heading);
            assert!(is_contiguous(&snake));
        }
    }
}

#[test]
fn test_can_advance_into_own_tail() {
    let board = Board::new(4, 4);
    // A closed square: the head faces the tail.
    let snake = Snake::build(0, &[(1, 1), (1, 2), (2, 2), (2, 1)], Heading::Down);
    let occupancy = Occupancy::from_snakes(board, &[snake.clone()]);
    assert!(snake.can_advance(&board, &occupancy));
    let mut moved = snake;
    moved.advance();
    assert!(!moved.has_collided_with(&board, &[moved.clone()]));
}

#[test]
fn test_can_advance_is_blocked_by_other_bodies_and_tails() {
    let board = Board::new(3, 3);
    let mover = Snake::build(0, &[(1, 0)], Heading::Right);
    let body = Snake::build(1, &[(0, 1), (1, 1), (2, 1)], Heading::Up);
    let occupancy = Occupancy::from_snakes(board, &[mover.clone(), body]);
    assert!(!mover.can_advance(&board, &occupancy));

    let tail = Snake::build(1, &[(0, 2), (0, 1), (1, 1)], Heading::Right);
    let occupancy = Occupancy::from_snakes(board, &[mover.clone(), tail]);
    assert!(!mover.can_advance(&board, &occupancy));
}

#[test]
fn test_can_advance_off_board() {
    let board = Board::new(3, 3);
    let snake = Snake::build(0, &[(1, 2), (1, 1)], Heading::Right);
    let occupancy = Occupancy::from_snakes(board, &[snake.clone()]);
    assert!(snake.can_advance(&board, &occupancy));
}

#[test]
fn test_has_collided_with() {
    let board = Board::new(3, 3);
    let a = Snake::build(0, &[(1, 1), (1, 0)], Heading::Right);
    let b = Snake::build(1, &[(0, 1), (1, 1), (2, 1)], Heading::Up);
    assert!(a.has_collided_with(&board, &[a.clone(), b.clone()]));
    assert!(!a.has_collided_with(&board, &[a.clone()]));

    let exiting = Snake::build(2, &[(1, 3), (1, 2)], Heading::Right);
    let ghost = Snake::build(3, &[(1, 3)], Heading::Down);
    assert!(!exiting.has_collided_with(&board, &[exiting.clone(), ghost]));
}

#[test]
fn test_has_collided_with_own_body() {
    let board = Board::new(4, 4);
    let snake = Snake::build(0, &[(1, 1), (1, 2), (2, 2), (2, 1), (1, 1)], Heading::Down);
    assert!(!snake.has_collided_with(&board, &[snake.clone()]));
    let snake = Snake::build(0, &[(1, 1), (1, 2), (2, 2), (2, 1), (1, 1), (0, 1)], Heading::Up);
    assert!(snake.has_collided_with(&board, &[snake.clone()]));
}

#[test]
fn test_fully_off_board_is_idempotent() {
    let board = Board::new(3, 3);
    let mut snake = Snake::build(0, &[(1, 1)], Heading::Right);
    let mut steps = 0;
    while !snake.is_fully_off_board(&board) {
        snake.advance();
        steps += 1;
    }
    assert_eq!(steps, 3);
    assert_eq!(snake.head(), Cell::new(1, 4));
    for _ in 0..10 {
        snake.advance();
        assert!(snake.is_fully_off_board(&board));
    }
}

#[test]
fn test_head_to_head_target() {
    let board = Board::new(3, 3);
    let a = Snake::build(0, &[(0, 0)], Heading::Right);
    let b = Snake::build(1, &[(0, 1)], Heading::Left);
    let snakes = [a.clone(), b.clone()];
    assert_eq!(a.head_to_head_target(&board, &snakes), Some(&b));
    assert_eq!(b.head_to_head_target(&board, &snakes), Some(&a));
    assert!(b.yields_to(&a));
    assert!(!a.yields_to(&b));

    let c = Snake::build(2, &[(1, 1)], Heading::Up);
    let snakes = [a.clone(), c.clone()];
    assert_eq!(a.head_to_head_target(&board, &snakes), None);
    assert_eq!(c.head_to_head_target(&board, &snakes), None);
}

#[test]
fn test_head_to_head_ignores_off_board_heads() {
    let board = Board::new(3, 3);
    let a = Snake::build(0, &[(0, 3)], Heading::Left);
    let b = Snake::build(1, &[(0, 2)], Heading::Right);
    let snakes = [a.clone(), b.clone()];
    assert_eq!(a.head_to_head_target(&board, &snakes), None);
    assert_eq!(b.head_to_head_target(&board, &snakes), None);
}
