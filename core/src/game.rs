use crate::{
    grid::board::Board,
    resolver::{resolve, TickOutcome},
    snake::{Snake, SnakeId},
};
use std::collections::BTreeSet;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct GameStats {
    pub exited: usize,
    pub collided: usize,
    /// Penalty removals.
    pub removed: usize,
}

/// A puzzle being played. Every change goes through `&mut self`, one snake at a time.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    snakes: Vec<Snake>,
    active: BTreeSet<SnakeId>,
    stats: GameStats,
}

impl Game {
    pub fn new(board: Board, snakes: Vec<Snake>) -> Self {
        Self {
            board,
            snakes,
            active: BTreeSet::new(),
            stats: GameStats::default(),
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    pub fn snake(&self, id: SnakeId) -> Option<&Snake> {
        self.snakes.iter().find(|snake| snake.id() == id)
    }

    pub fn index_of(&self, id: SnakeId) -> Option<usize> {
        self.snakes.iter().position(|snake| snake.id() == id)
    }

    pub fn is_active(&self, id: SnakeId) -> bool {
        self.active.contains(&id)
    }

    pub fn active<'a>(&'a self) -> impl 'a + Iterator<Item = SnakeId> {
        self.active.iter().copied()
    }

    /// Sets a snake moving. Returns `false` if it is unknown or already moving.
    pub fn tap(&mut self, id: SnakeId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.active.insert(id)
    }

    /// Resolves a single tick of `id`, `None` if there is no such snake.
    pub fn tick(&mut self, id: SnakeId) -> Option<TickOutcome> {
        let index = self.index_of(id)?;
        let outcome = resolve(&self.board, &mut self.snakes, index);
        match outcome {
            TickOutcome::Moved => {}
            TickOutcome::Blocked => {
                self.active.remove(&id);
            }
            TickOutcome::Exited => {
                self.active.remove(&id);
                self.stats.exited += 1;
            }
            TickOutcome::Collided => {
                self.active.remove(&id);
                self.stats.collided += 1;
            }
        }
        Some(outcome)
    }

    /// One scheduler pass over the moving snakes, by ascending id.
    pub fn step(&mut self) -> Vec<(SnakeId, TickOutcome)> {
        let ids: Vec<SnakeId> = self.active.iter().copied().collect();
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            match self.tick(id) {
                Some(outcome) => outcomes.push((id, outcome)),
                None => {
                    self.active.remove(&id);
                }
            }
        }
        outcomes
    }

    /// Takes a snake off the board without going through the movement rules.
    pub fn remove(&mut self, id: SnakeId) -> Option<Snake> {
        let index = self.index_of(id)?;
        self.active.remove(&id);
        self.stats.removed += 1;
        Some(self.snakes.remove(index))
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn is_solved(&self) -> bool {
        self.snakes.is_empty()
    }
}

#[cfg(test)]
use crate::grid::{coordinates::Cell, heading::Heading};

#[test]
fn test_tapped_snake_exits() {
    let mut game = Game::new(
        Board::new(3, 3),
        vec![Snake::build(0, &[(1, 1)], Heading::Right)],
    );
    assert!(game.step().is_empty());
    assert!(game.tap(SnakeId(0)));
    assert!(!game.tap(SnakeId(0)));
    assert_eq!(game.step(), vec![(SnakeId(0), TickOutcome::Moved)]);
    assert_eq!(game.step(), vec![(SnakeId(0), TickOutcome::Moved)]);
    assert_eq!(game.step(), vec![(SnakeId(0), TickOutcome::Exited)]);
    assert!(game.is_solved());
    assert!(game.step().is_empty());
    assert_eq!(
        game.stats(),
        GameStats {
            exited: 1,
            ..GameStats::default()
        }
    );
}

#[test]
fn test_face_off_in_one_pass() {
    let mut game = Game::new(
        Board::new(3, 3),
        vec![
            Snake::build(0, &[(0, 0)], Heading::Right),
            Snake::build(1, &[(0, 1)], Heading::Left),
        ],
    );
    game.tap(SnakeId(1));
    game.tap(SnakeId(0));
    assert_eq!(
        game.step(),
        vec![
            (SnakeId(0), TickOutcome::Blocked),
            (SnakeId(1), TickOutcome::Moved)
        ]
    );
    assert!(!game.is_active(SnakeId(0)));
    assert_eq!(game.snake(SnakeId(1)).unwrap().head(), Cell::new(-1, 1));
    assert_eq!(game.step(), vec![(SnakeId(1), TickOutcome::Exited)]);

    assert!(game.tap(SnakeId(0)));
    assert_eq!(game.step(), vec![(SnakeId(0), TickOutcome::Moved)]);
    assert_eq!(game.snake(SnakeId(0)).unwrap().head(), Cell::new(0, 1));
}

#[test]
fn test_ids_survive_removals() {
    let mut game = Game::new(
        Board::new(4, 4),
        vec![
            Snake::build(0, &[(0, 0)], Heading::Up),
            Snake::build(1, &[(1, 1)], Heading::Up),
            Snake::build(2, &[(2, 2)], Heading::Right),
        ],
    );
    assert_eq!(game.index_of(SnakeId(2)), Some(2));
    assert!(game.tap(SnakeId(2)));
    assert!(game.remove(SnakeId(0)).is_some());
    assert!(game.remove(SnakeId(0)).is_none());
    assert_eq!(game.index_of(SnakeId(2)), Some(1));
    assert!(game.is_active(SnakeId(2)));
    assert_eq!(game.step(), vec![(SnakeId(2), TickOutcome::Moved)]);
    assert_eq!(game.snake(SnakeId(2)).unwrap().head(), Cell::new(2, 3));
    assert_eq!(game.tick(SnakeId(0)), None);
    assert!(!game.tap(SnakeId(0)));
    assert_eq!(game.stats().removed, 1);
    assert_eq!(game.active().collect::<Vec<_>>(), vec![SnakeId(2)]);
}

#[test]
fn test_verified_solution_plays_out() {
    use crate::{
        generator::{Assembly, GeneratorConfig},
        progress::CancelToken,
        verifier::{verify_solvable, VerifierLimits},
    };
    use rand::{rngs::StdRng, SeedableRng};

    let config = GeneratorConfig {
        rows: 12,
        cols: 8,
        max_len: 12,
        ..GeneratorConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(21);
    let mut assembly = Assembly::new(config, CancelToken::new());
    while !assembly.step(&mut rng) {}
    let board = assembly.board();
    let snakes = assembly.into_snakes();
    let solution = verify_solvable(&board, &snakes, &VerifierLimits::default())
        .solution
        .unwrap();

    let ids: Vec<SnakeId> = snakes.iter().map(|snake| snake.id()).collect();
    let mut game = Game::new(board, snakes);
    for index in solution {
        let outcome = game.tick(ids[index]).unwrap();
        assert!(outcome == TickOutcome::Moved || outcome == TickOutcome::Exited);
    }
    assert!(game.is_solved());
    assert_eq!(game.stats().exited, ids.len());
}
