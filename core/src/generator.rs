use crate::{
    color::Color,
    deadlock::find_deadlock_in,
    grid::{
        board::Board,
        coordinates::Cell,
        heading::{Heading, HEADINGS},
        storage::Occupancy,
    },
    progress::{CancelToken, Phase, Progress},
    snake::{Snake, SnakeId},
    verifier::{verify_solvable_with_progress, VerifierLimits},
};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Forward steps re-simulated once a body is built.
const FORWARD_CHECK_STEPS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("puzzle generation was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub cols: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub target_coverage: f64,
    /// Construction attempts for a single snake.
    pub snake_attempts: usize,
    /// Failed placements after which a board is considered full.
    pub failure_budget: usize,
    pub puzzle_attempts: usize,
    pub verify: bool,
    pub verifier: VerifierLimits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 36,
            cols: 18,
            min_len: 3,
            max_len: 50,
            target_coverage: 0.8,
            snake_attempts: 500,
            failure_budget: 100,
            puzzle_attempts: 10,
            verify: false,
            verifier: VerifierLimits::default(),
        }
    }
}

impl GeneratorConfig {
    /// Level 1 is the easiest: sparse boards of short snakes.
    pub fn for_level(level: u32) -> Self {
        let step = level.max(1) - 1;
        Self {
            target_coverage: (0.4 + 0.05 * step as f64).min(0.8),
            max_len: (8 + 4 * step as usize).min(50),
            ..Self::default()
        }
    }

    pub fn board(&self) -> Board {
        Board::new(self.rows, self.cols)
    }

    fn length_range(&self) -> (usize, usize) {
        let min_len = self.min_len.max(1);
        (min_len, self.max_len.max(min_len))
    }
}

/// Tries to place one snake that leaves the board by moving straight without trapping any
/// snake of `existing`. `occupied` is the occupancy of `existing`.
pub fn generate_snake<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GeneratorConfig,
    occupied: &Occupancy,
    existing: &[Snake],
    id: SnakeId,
) -> Option<Snake> {
    let board = occupied.board();
    if board.area() == 0 {
        return None;
    }
    let (min_len, max_len) = config.length_range();
    for attempt in 0..config.snake_attempts {
        let length = rng.gen_range(min_len, max_len + 1);
        let heading = *HEADINGS.choose(rng)?;
        let cells = match build_backward(rng, &board, length, heading, occupied) {
            Some(cells) => cells,
            None => continue,
        };
        let snake = match Snake::new(id, cells, Color::random(rng)) {
            Ok(snake) => snake.with_heading(heading),
            Err(err) => {
                warn!("discarding malformed snake: {}", err);
                continue;
            }
        };
        if !runs_clear(&board, &snake, occupied, existing) {
            continue;
        }
        if let Some(deadlock) = find_deadlock_in(&board, &snake, existing, occupied) {
            trace!("attempt {}: rejected on {}", attempt, deadlock);
            continue;
        }
        if traps_existing(&board, &snake, existing) {
            trace!("attempt {}: would trap a placed snake", attempt);
            continue;
        }
        trace!(
            "snake {} of length {} placed after {} attempts",
            id,
            length,
            attempt + 1
        );
        return Some(snake);
    }
    None
}

/// Lays the body from the head backwards, head-first. The first segment goes straight back so
/// the head faces `heading`.
fn build_backward<R: Rng + ?Sized>(
    rng: &mut R,
    board: &Board,
    length: usize,
    heading: Heading,
    occupied: &Occupancy,
) -> Option<Vec<Cell>> {
    let head = Cell::new(
        rng.gen_range(0, board.rows() as isize),
        rng.gen_range(0, board.cols() as isize),
    );
    if occupied.contains_position(head) {
        return None;
    }

    let mut cells = Vec::with_capacity(length);
    cells.push(head);
    let mut back = heading.opposite();
    for index in 1..length {
        let current = cells[index - 1];
        let mut directions: SmallVec<[Heading; 3]> = SmallVec::new();
        directions.push(back);
        if index > 1 {
            directions.extend_from_slice(&back.perpendiculars());
        }
        let options: SmallVec<[(Cell, Heading); 3]> = directions
            .into_iter()
            .map(|direction| (current.neighbor(direction), direction))
            .filter(|(cell, _)| {
                board.contains(*cell)
                    && !occupied.contains_position(*cell)
                    && !cells.contains(cell)
                    && !cells[..index - 1].iter().any(|c| c.is_adjacent(*cell))
                    && !blocks_own_path(head, heading, *cell, index, length)
            })
            .collect();
        let (cell, direction) = *options.choose(rng)?;
        cells.push(cell);
        back = direction;
    }
    Some(cells)
}

/// A segment at `index` lying `k` cells ahead of the head is still body, tail excepted, when the
/// head arrives if `index + k < length`.
fn blocks_own_path(head: Cell, heading: Heading, cell: Cell, index: usize, length: usize) -> bool {
    (1..length).any(|k| index + k < length && head.ray(heading, k) == cell)
}

/// Re-simulates the first straight moves against the own body and the immediate neighbour.
fn runs_clear(board: &Board, snake: &Snake, occupied: &Occupancy, existing: &[Snake]) -> bool {
    let head = snake.head();
    let steps = snake.len().min(FORWARD_CHECK_STEPS);
    for step in 1..=steps {
        let cell = head.ray(snake.heading(), step);
        if !board.contains(cell) {
            break;
        }
        if step == 1 {
            if cell == snake.tail() {
                continue;
            }
            if let Some(owner) = occupied.owner(cell) {
                if existing[owner].tail() != cell {
                    return false;
                }
            }
        }
        if let Some(segment) = snake.segment_index(cell) {
            if segment + step < snake.len() {
                return false;
            }
        }
    }
    true
}

fn traps_existing(board: &Board, candidate: &Snake, existing: &[Snake]) -> bool {
    let last = candidate.len() - 1;
    existing
        .iter()
        .filter(|snake| snake.has_head_on_board(board))
        .any(|snake| {
            let next = snake.next_head();
            next != snake.tail() && candidate.body().iter().take(last).any(|c| *c == next)
        })
}

/// Board assembly driven one placement at a time.
pub struct Assembly {
    config: GeneratorConfig,
    occupancy: Occupancy,
    snakes: Vec<Snake>,
    failures: usize,
    next_id: usize,
    cancel: CancelToken,
    finished: bool,
}

impl Assembly {
    pub fn new(config: GeneratorConfig, cancel: CancelToken) -> Self {
        let occupancy = Occupancy::new(config.board());
        Self {
            config,
            occupancy,
            snakes: Vec::new(),
            failures: 0,
            next_id: 0,
            cancel,
            finished: false,
        }
    }

    /// Tries one placement. Returns `true` once the board is done: target coverage reached,
    /// failure budget spent or cancelled.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.finished {
            return true;
        }
        if self.cancel.is_cancelled() {
            info!("assembly cancelled with {} snakes", self.snakes.len());
            self.finished = true;
            return true;
        }
        if self.coverage() >= self.config.target_coverage {
            self.finished = true;
            return true;
        }

        let id = SnakeId(self.next_id);
        match generate_snake(rng, &self.config, &self.occupancy, &self.snakes, id) {
            Some(snake) => {
                self.occupancy.occupy(self.snakes.len(), &snake);
                self.snakes.push(snake);
                self.next_id += 1;
                if self.coverage() >= self.config.target_coverage {
                    self.finished = true;
                }
            }
            None => {
                self.failures += 1;
                if self.failures >= self.config.failure_budget {
                    debug!(
                        "board full after {} failed placements at coverage {:.2}",
                        self.failures,
                        self.coverage()
                    );
                    self.finished = true;
                }
            }
        }
        self.finished
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn coverage(&self) -> f64 {
        self.occupancy.coverage()
    }

    pub fn board(&self) -> Board {
        self.occupancy.board()
    }

    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    pub fn progress(&self) -> Progress {
        let target = self.config.target_coverage;
        let percent = if target > 0.0 {
            100.0 * self.coverage() / target
        } else {
            100.0
        };
        Progress::new(
            Phase::Placing,
            percent,
            format!("Placing snakes... ({} placed)", self.snakes.len()),
        )
    }

    pub fn into_snakes(self) -> Vec<Snake> {
        self.snakes
    }
}

/// Assembles boards until one is accepted. Without verification the first non-empty board is
/// returned. With verification the first confirmed board is, or the last one if none was.
pub fn generate_puzzle<R, F>(
    rng: &mut R,
    config: &GeneratorConfig,
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<Vec<Snake>, GenerateError>
where
    R: Rng + ?Sized,
    F: FnMut(Progress),
{
    let attempts = config.puzzle_attempts.max(1);
    let board = config.board();
    let mut last = Vec::new();
    for attempt in 0..attempts {
        on_progress(Progress::new(
            Phase::Generating,
            40.0 * attempt as f64 / attempts as f64,
            format!(
                "Generating puzzle... (attempt {}/{})",
                attempt + 1,
                attempts
            ),
        ));

        let mut assembly = Assembly::new(config.clone(), cancel.clone());
        let mut placed = 0;
        while !assembly.step(rng) {
            if assembly.snakes().len() != placed {
                placed = assembly.snakes().len();
                on_progress(assembly.progress());
            }
        }
        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        info!(
            "attempt {}: {} snakes, coverage {:.2}",
            attempt + 1,
            assembly.snakes().len(),
            assembly.coverage()
        );
        let snakes = assembly.into_snakes();
        if snakes.is_empty() {
            last = snakes;
            continue;
        }
        if !config.verify {
            on_progress(Progress::new(Phase::Complete, 100.0, "Puzzle ready!"));
            return Ok(snakes);
        }
        let verification =
            verify_solvable_with_progress(&board, &snakes, &config.verifier, &mut on_progress);
        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        if verification.solvable {
            on_progress(Progress::new(Phase::Complete, 100.0, "Puzzle ready!"));
            return Ok(snakes);
        }
        warn!("attempt {}: board could not be verified", attempt + 1);
        last = snakes;
    }
    if !last.is_empty() {
        warn!("no verified board after {} attempts, using the last one", attempts);
    }
    on_progress(Progress::new(Phase::Complete, 100.0, "Puzzle ready!"));
    Ok(last)
}

#[cfg(test)]
use crate::{deadlock::has_exit_order, verifier::verify_solvable};
#[cfg(test)]
use rand::{rngs::StdRng, SeedableRng};

#[cfg(test)]
fn assemble(config: GeneratorConfig, seed: u64) -> (Board, Vec<Snake>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut assembly = Assembly::new(config, CancelToken::new());
    while !assembly.step(&mut rng) {}
    (assembly.board(), assembly.into_snakes())
}

#[test]
fn test_for_level() {
    let easy = GeneratorConfig::for_level(1);
    assert!((easy.target_coverage - 0.4).abs() < 1e-9);
    assert_eq!(easy.max_len, 8);
    assert_eq!((easy.rows, easy.cols), (36, 18));

    let third = GeneratorConfig::for_level(3);
    assert!((third.target_coverage - 0.5).abs() < 1e-9);
    assert_eq!(third.max_len, 16);

    let hard = GeneratorConfig::for_level(40);
    assert!((hard.target_coverage - 0.8).abs() < 1e-9);
    assert_eq!(hard.max_len, 50);
    assert_eq!(GeneratorConfig::for_level(0), easy);
}

#[test]
fn test_generated_snakes_hold_their_invariants() {
    let config = GeneratorConfig {
        rows: 12,
        cols: 10,
        min_len: 2,
        max_len: 9,
        ..GeneratorConfig::default()
    };
    let board = config.board();
    let mut rng = StdRng::seed_from_u64(3);
    let mut existing = Vec::new();
    let mut occupancy = Occupancy::new(board);
    for id in 0..30 {
        let snake = match generate_snake(&mut rng, &config, &occupancy, &existing, SnakeId(id)) {
            Some(snake) => snake,
            None => break,
        };
        assert_eq!(snake.id(), SnakeId(id));
        assert!(snake.len() >= 2 && snake.len() <= 9);
        let body: Vec<Cell> = snake.body().iter().copied().collect();
        for (index, cell) in body.iter().enumerate() {
            assert!(board.contains(*cell));
            assert!(!occupancy.contains_position(*cell));
            assert!(!body[index + 1..].contains(cell));
            for later in body.iter().skip(index + 2) {
                assert!(!cell.is_adjacent(*later));
            }
        }
        assert_eq!(Heading::between(body[1], body[0]), Some(snake.heading()));
        occupancy.occupy(existing.len(), &snake);
        existing.push(snake);
        assert!(has_exit_order(&board, &existing));
    }
    assert!(existing.len() > 5);
}

#[test]
fn test_assembly_stops_at_target_coverage() {
    let config = GeneratorConfig {
        rows: 12,
        cols: 8,
        max_len: 10,
        target_coverage: 0.3,
        ..GeneratorConfig::default()
    };
    let (board, snakes) = assemble(config, 5);
    let occupancy = Occupancy::from_snakes(board, &snakes);
    assert!(occupancy.coverage() >= 0.3);
    assert_eq!(
        occupancy.len(),
        snakes.iter().map(|snake| snake.len()).sum::<usize>()
    );
    for (index, snake) in snakes.iter().enumerate() {
        assert_eq!(snake.id(), SnakeId(index));
    }
}

#[test]
fn test_assembly_gives_up_on_a_full_board() {
    let config = GeneratorConfig {
        rows: 2,
        cols: 2,
        min_len: 3,
        max_len: 3,
        target_coverage: 1.0,
        failure_budget: 5,
        ..GeneratorConfig::default()
    };
    let (_, snakes) = assemble(config, 1);
    assert!(snakes.len() <= 1);
}

#[test]
fn test_generated_boards_are_solvable() {
    for seed in 0..10 {
        let config = GeneratorConfig {
            rows: 12,
            cols: 8,
            max_len: 12,
            ..GeneratorConfig::default()
        };
        let (board, snakes) = assemble(config, seed);
        assert!(!snakes.is_empty());
        let verification = verify_solvable(&board, &snakes, &VerifierLimits::default());
        assert!(verification.solvable, "seed {}", seed);
    }
}

#[test]
fn test_runs_clear_rejects_a_body_folded_over_its_own_path() {
    let board = Board::new(3, 3);
    let occupancy = Occupancy::new(board);
    // The head at (1, 1) points up into (0, 1), still body when the head gets there.
    let folded = Snake::build(0, &[(1, 1), (1, 2), (0, 2), (0, 1), (0, 0)], Heading::Up);
    assert!(!runs_clear(&board, &folded, &occupancy, &[]));
    // Without the last segment (0, 1) is the tail and moves away first.
    let shorter = Snake::build(0, &[(1, 1), (1, 2), (0, 2), (0, 1)], Heading::Up);
    assert!(runs_clear(&board, &shorter, &occupancy, &[]));
}

#[test]
fn test_runs_clear_only_lets_the_first_step_into_a_neighbour_tail() {
    let board = Board::new(3, 3);
    let candidate = Snake::build(1, &[(1, 1), (2, 1)], Heading::Up);

    let tail_ahead = vec![Snake::build(0, &[(0, 0), (0, 1)], Heading::Left)];
    let occupancy = Occupancy::from_snakes(board, &tail_ahead);
    assert!(runs_clear(&board, &candidate, &occupancy, &tail_ahead));

    let body_ahead = vec![Snake::build(0, &[(0, 1), (0, 0)], Heading::Right)];
    let occupancy = Occupancy::from_snakes(board, &body_ahead);
    assert!(!runs_clear(&board, &candidate, &occupancy, &body_ahead));
}

#[test]
fn test_traps_existing_when_the_body_covers_a_next_cell() {
    let board = Board::new(3, 3);
    // Heads to (1, 1).
    let existing = vec![Snake::build(0, &[(1, 0)], Heading::Right)];
    let across = Snake::build(1, &[(0, 1), (1, 1), (2, 1)], Heading::Up);
    assert!(traps_existing(&board, &across, &existing));
}

#[test]
fn test_traps_existing_ignores_the_candidate_tail() {
    let board = Board::new(3, 3);
    let existing = vec![Snake::build(0, &[(1, 0)], Heading::Right)];
    let tail_there = Snake::build(1, &[(2, 2), (2, 1), (1, 1)], Heading::Right);
    assert!(!traps_existing(&board, &tail_there, &existing));
    let elsewhere = Snake::build(1, &[(0, 2), (0, 1)], Heading::Right);
    assert!(!traps_existing(&board, &elsewhere, &existing));
}

#[test]
// Slow in debug builds: run with `cargo test --release -- --ignored`.
#[ignore]
fn test_fifty_full_size_puzzles_are_solvable() {
    let config = GeneratorConfig::default();
    let board = config.board();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..50 {
        let snakes = generate_puzzle(&mut rng, &config, &CancelToken::new(), |_| {}).unwrap();
        assert!(!snakes.is_empty());
        let verification = verify_solvable(&board, &snakes, &config.verifier);
        assert!(verification.solvable);
    }
}

#[test]
fn test_generate_puzzle_with_verification_reports_progress() {
    let config = GeneratorConfig {
        rows: 10,
        cols: 10,
        max_len: 8,
        target_coverage: 0.5,
        verify: true,
        ..GeneratorConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(9);
    let mut phases = Vec::new();
    let snakes = generate_puzzle(&mut rng, &config, &CancelToken::new(), |progress| {
        phases.push(progress.phase)
    })
    .unwrap();
    assert!(!snakes.is_empty());
    assert_eq!(phases.first(), Some(&Phase::Generating));
    assert_eq!(phases.last(), Some(&Phase::Complete));
    assert!(phases.contains(&Phase::Placing));
}

#[test]
fn test_generate_puzzle_can_be_cancelled() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        generate_puzzle(&mut rng, &GeneratorConfig::default(), &cancel, |_| {}),
        Err(GenerateError::Cancelled)
    );
}

#[test]
fn test_empty_target_gives_an_empty_puzzle() {
    let config = GeneratorConfig {
        target_coverage: 0.0,
        puzzle_attempts: 2,
        ..GeneratorConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(0);
    let snakes = generate_puzzle(&mut rng, &config, &CancelToken::new(), |_| {}).unwrap();
    assert!(snakes.is_empty());
}
