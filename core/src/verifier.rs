use crate::{
    deadlock::exit_ray,
    grid::{board::Board, storage::Occupancy},
    progress::{Phase, Progress},
    snake::Snake,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

const REPORT_INTERVAL: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierLimits {
    /// Searched single steps, exit runs excluded.
    pub max_depth: usize,
    pub max_states: usize,
}

impl Default for VerifierLimits {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_states: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub solvable: bool,
    /// Indices into the verified snakes, one per single step.
    pub solution: Option<Vec<usize>>,
}

impl Verification {
    fn solved(moves: Vec<usize>) -> Self {
        Self {
            solvable: true,
            solution: Some(moves),
        }
    }

    fn unsolvable() -> Self {
        Self {
            solvable: false,
            solution: None,
        }
    }
}

struct State {
    snakes: Vec<Snake>,
    moves: Vec<usize>,
    depth: usize,
}

pub fn verify_solvable(board: &Board, snakes: &[Snake], limits: &VerifierLimits) -> Verification {
    verify_solvable_with_progress(board, snakes, limits, |_| {})
}

/// Breadth-first search over single steps. Running out of states is reported as unsolvable.
pub fn verify_solvable_with_progress<F>(
    board: &Board,
    snakes: &[Snake],
    limits: &VerifierLimits,
    mut on_progress: F,
) -> Verification
where
    F: FnMut(Progress),
{
    if is_solved(board, snakes) {
        on_progress(Progress::new(
            Phase::Validating,
            100.0,
            "Checking solution...",
        ));
        return Verification::solved(Vec::new());
    }

    let mut root = State {
        snakes: snakes.to_vec(),
        moves: Vec::new(),
        depth: 0,
    };
    run_out(board, &mut root.snakes, &mut root.moves);

    let mut visited = HashSet::new();
    visited.insert(state_key(&root.snakes));
    let mut queue = VecDeque::new();
    queue.push_back(root);
    let mut explored = 0;

    while let Some(current) = queue.pop_front() {
        if explored >= limits.max_states || visited.len() > limits.max_states {
            warn!(
                "verification gave up after {} states ({} seen)",
                explored,
                visited.len()
            );
            on_progress(Progress::new(
                Phase::Validating,
                100.0,
                "Validation timeout - cannot verify",
            ));
            return Verification::unsolvable();
        }
        explored += 1;
        if explored % REPORT_INTERVAL == 0 {
            on_progress(Progress::new(
                Phase::Validating,
                (90.0 * explored as f64 / limits.max_states as f64).min(95.0),
                format!("Exploring solutions... ({}/{})", explored, limits.max_states),
            ));
        }

        if is_solved(board, &current.snakes) {
            debug!(
                "solution of {} moves found after {} states",
                current.moves.len(),
                explored
            );
            on_progress(Progress::new(Phase::Validating, 100.0, "Solution found!"));
            return Verification::solved(current.moves);
        }
        if current.depth >= limits.max_depth {
            continue;
        }

        for next in successors(board, &current) {
            if visited.insert(state_key(&next.snakes)) {
                queue.push_back(next);
            }
        }
    }

    debug!("no solution after {} states", explored);
    on_progress(Progress::new(Phase::Validating, 100.0, "No solution found"));
    Verification::unsolvable()
}

fn is_solved(board: &Board, snakes: &[Snake]) -> bool {
    snakes.iter().all(|snake| snake.is_fully_off_board(board))
}

/// Order independent.
fn state_key(snakes: &[Snake]) -> String {
    snakes
        .iter()
        .map(|snake| snake.body().iter().join("|"))
        .sorted()
        .join("::")
}

fn successors<'a>(board: &'a Board, current: &'a State) -> impl 'a + Iterator<Item = State> {
    let occupancy = Occupancy::from_snakes(*board, &current.snakes);
    (0..current.snakes.len()).filter_map(move |index| {
        let snake = &current.snakes[index];
        if snake.is_fully_off_board(board) || !snake.can_advance(board, &occupancy) {
            return None;
        }
        let mut snakes = current.snakes.clone();
        snakes[index].advance();
        if snakes[index].has_collided_with(board, &snakes) {
            return None;
        }
        let mut moves = current.moves.clone();
        moves.push(index);
        run_out(board, &mut snakes, &mut moves);
        Some(State {
            snakes,
            moves,
            depth: current.depth + 1,
        })
    })
}

/// Runs every snake with a clear exit ray straight off the board, until none is left.
fn run_out(board: &Board, snakes: &mut [Snake], moves: &mut Vec<usize>) {
    loop {
        let occupancy = Occupancy::from_snakes(*board, snakes);
        let runner = (0..snakes.len()).find(|index| {
            let snake = &snakes[*index];
            !snake.is_fully_off_board(board) && exit_ray(board, snake, *index, &occupancy).is_clear()
        });
        let index = match runner {
            Some(index) => index,
            None => return,
        };
        while !snakes[index].is_fully_off_board(board) {
            snakes[index].advance();
            moves.push(index);
        }
    }
}

#[cfg(test)]
use crate::grid::heading::Heading;

#[cfg(test)]
fn crossing_board() -> (Board, Vec<Snake>) {
    // Every exit ray is blocked until the second snake steps aside.
    (
        Board::new(3, 4),
        vec![
            Snake::build(0, &[(0, 0)], Heading::Down),
            Snake::build(1, &[(1, 1), (1, 0)], Heading::Right),
            Snake::build(2, &[(1, 3)], Heading::Up),
            Snake::build(3, &[(0, 3)], Heading::Left),
        ],
    )
}

#[cfg(test)]
fn replay(board: &Board, snakes: &[Snake], moves: &[usize]) -> Vec<Snake> {
    let mut snakes = snakes.to_vec();
    for index in moves {
        let occupancy = Occupancy::from_snakes(*board, &snakes);
        assert!(snakes[*index].can_advance(board, &occupancy));
        snakes[*index].advance();
        assert!(!snakes[*index].has_collided_with(board, &snakes));
    }
    snakes
}

#[test]
fn test_empty_board_is_solved() {
    let board = Board::new(3, 3);
    assert_eq!(
        verify_solvable(&board, &[], &VerifierLimits::default()),
        Verification::solved(vec![])
    );
}

#[test]
fn test_single_snake_solution() {
    let board = Board::new(3, 3);
    let snakes = vec![Snake::build(0, &[(1, 1)], Heading::Right)];
    let verification = verify_solvable(&board, &snakes, &VerifierLimits::default());
    assert_eq!(verification.solution, Some(vec![0, 0, 0]));
}

#[test]
fn test_interlocked_snakes_are_unsolvable() {
    let board = Board::new(5, 5);
    let snakes = vec![
        Snake::build(0, &[(2, 2), (2, 1), (2, 0)], Heading::Right),
        Snake::build(
            1,
            &[(3, 2), (4, 2), (4, 3), (3, 3), (2, 3), (1, 3)],
            Heading::Up,
        ),
    ];
    assert_eq!(
        verify_solvable(&board, &snakes, &VerifierLimits::default()),
        Verification::unsolvable()
    );
}

#[test]
fn test_search_finds_the_unlocking_move() {
    let (board, snakes) = crossing_board();
    let verification = verify_solvable(&board, &snakes, &VerifierLimits::default());
    assert!(verification.solvable);
    let solution = verification.solution.unwrap();
    assert_eq!(solution[0], 1);
    let end = replay(&board, &snakes, &solution);
    assert!(end.iter().all(|snake| snake.is_fully_off_board(&board)));
}

#[test]
fn test_exhausted_limits_are_unsolvable() {
    let (board, snakes) = crossing_board();
    let tight_states = VerifierLimits {
        max_states: 1,
        ..VerifierLimits::default()
    };
    assert!(!verify_solvable(&board, &snakes, &tight_states).solvable);
    let tight_depth = VerifierLimits {
        max_depth: 0,
        ..VerifierLimits::default()
    };
    assert!(!verify_solvable(&board, &snakes, &tight_depth).solvable);
}

#[test]
fn test_progress_ends_with_the_outcome() {
    let (board, snakes) = crossing_board();
    let mut reports = Vec::new();
    verify_solvable_with_progress(&board, &snakes, &VerifierLimits::default(), |progress| {
        reports.push(progress)
    });
    let last = reports.last().unwrap();
    assert_eq!(last.phase, Phase::Validating);
    assert_eq!(last.percent, 100);
    assert_eq!(last.message, "Solution found!");
}

#[test]
fn test_state_key_ignores_snake_order() {
    let (_, snakes) = crossing_board();
    let mut reversed = snakes.clone();
    reversed.reverse();
    let keys = hashset! {state_key(&snakes), state_key(&reversed)};
    assert_eq!(keys.len(), 1);
    assert_eq!(state_key(&snakes[1..2]), "1,1|1,0");
}
