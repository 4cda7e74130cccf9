use crate::{
    grid::{board::Board, heading::Heading, storage::Occupancy},
    snake::Snake,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TickOutcome {
    Moved,
    Blocked,
    Collided,
    Exited,
}

#[derive(Debug, Clone)]
pub struct Tick {
    pub snakes: Vec<Snake>,
    pub outcome: TickOutcome,
}

/// Resolves one tick of the snake at `index` against a copy of `snakes`.
pub fn tick(board: &Board, snakes: &[Snake], index: usize) -> Tick {
    let mut snakes = snakes.to_vec();
    let outcome = resolve(board, &mut snakes, index);
    Tick { snakes, outcome }
}

/// Resolves one tick of the snake at `index` in place. A collided or exited snake is removed
/// from `snakes`, shifting the indices of the later ones.
pub fn resolve(board: &Board, snakes: &mut Vec<Snake>, index: usize) -> TickOutcome {
    if index >= snakes.len() {
        warn!(
            "tick requested for snake {} out of {}",
            index,
            snakes.len()
        );
        return TickOutcome::Blocked;
    }

    let occupancy = Occupancy::from_snakes(*board, snakes);

    let previous = snakes[index].heading();
    let yields = snakes[index]
        .head_to_head_target(board, snakes)
        .map_or(false, |target| snakes[index].yields_to(target));
    if yields {
        match find_turn(board, snakes, index, &occupancy) {
            Some(heading) => {
                debug!(
                    "snake {} turns {:?} out of a face-off",
                    snakes[index].id(),
                    heading
                );
                snakes[index].set_heading(heading);
            }
            None => {
                debug!("snake {} is stuck in a face-off", snakes[index].id());
                return TickOutcome::Blocked;
            }
        }
    }

    if !snakes[index].can_advance(board, &occupancy) {
        snakes[index].set_heading(previous);
        return TickOutcome::Blocked;
    }
    snakes[index].advance();

    if snakes[index].has_collided_with(board, snakes) {
        let snake = snakes.remove(index);
        debug!("snake {} collided at {:?}", snake.id(), snake.head());
        TickOutcome::Collided
    } else if snakes[index].is_fully_off_board(board) {
        let snake = snakes.remove(index);
        debug!("snake {} exited", snake.id());
        TickOutcome::Exited
    } else {
        TickOutcome::Moved
    }
}

/// Clockwise first, then counter-clockwise, then straight back.
fn find_turn(
    board: &Board,
    snakes: &[Snake],
    index: usize,
    occupancy: &Occupancy,
) -> Option<Heading> {
    let heading = snakes[index].heading();
    [
        heading.clockwise(),
        heading.counter_clockwise(),
        heading.opposite(),
    ]
    .iter()
    .copied()
    .find(|candidate| is_turn_legal(board, snakes, index, occupancy, *candidate))
}

fn is_turn_legal(
    board: &Board,
    snakes: &[Snake],
    index: usize,
    occupancy: &Occupancy,
    heading: Heading,
) -> bool {
    let next = snakes[index].head().neighbor(heading);
    if !board.contains(next) {
        return true;
    }
    match occupancy.owner(next) {
        None => true,
        Some(owner) => snakes[owner].tail() == next,
    }
}

#[cfg(test)]
fn changed_bodies(before: &[Snake], after: &[Snake]) -> usize {
    before
        .iter()
        .filter(|snake| {
            after
                .iter()
                .find(|other| other.id() == snake.id())
                .map_or(true, |other| other.body() != snake.body())
        })
        .count()
}

#[test]
fn test_single_snake_exits_three_by_three() {
    use crate::grid::coordinates::Cell;

    let board = Board::new(3, 3);
    let snakes = vec![Snake::build(0, &[(1, 1)], Heading::Right)];

    let first = tick(&board, &snakes, 0);
    assert_eq!(first.outcome, TickOutcome::Moved);
    assert_eq!(first.snakes[0].head(), Cell::new(1, 2));

    let second = tick(&board, &first.snakes, 0);
    assert_eq!(second.outcome, TickOutcome::Moved);
    assert_eq!(second.snakes[0].head(), Cell::new(1, 3));

    let third = tick(&board, &second.snakes, 0);
    assert_eq!(third.outcome, TickOutcome::Exited);
    assert!(third.snakes.is_empty());
}

#[test]
fn test_face_off_is_resolved_by_the_later_snake() {
    use crate::grid::coordinates::Cell;

    let board = Board::new(3, 3);
    let mut snakes = vec![
        Snake::build(0, &[(0, 0)], Heading::Right),
        Snake::build(1, &[(0, 1)], Heading::Left),
    ];
    assert!(snakes[0].head_to_head_target(&board, &snakes).is_some());
    assert!(snakes[1].head_to_head_target(&board, &snakes).is_some());

    assert_eq!(resolve(&board, &mut snakes, 0), TickOutcome::Blocked);
    assert_eq!(snakes[0].head(), Cell::new(0, 0));
    assert_eq!(snakes[0].heading(), Heading::Right);

    assert_eq!(resolve(&board, &mut snakes, 1), TickOutcome::Moved);
    assert_eq!(snakes[1].heading(), Heading::Up);
    assert_eq!(snakes[1].head(), Cell::new(-1, 1));
    assert!(snakes[0].head_to_head_target(&board, &snakes).is_none());
    assert!(snakes[1].head_to_head_target(&board, &snakes).is_none());

    assert_eq!(resolve(&board, &mut snakes, 0), TickOutcome::Moved);
    assert_eq!(snakes[0].head(), Cell::new(0, 1));
}

#[test]
fn test_face_off_turns_counter_clockwise_when_clockwise_is_taken() {
    use crate::grid::coordinates::Cell;

    let board = Board::new(3, 3);
    let mut snakes = vec![
        Snake::build(0, &[(1, 0)], Heading::Right),
        Snake::build(1, &[(1, 1), (1, 2)], Heading::Left),
        Snake::build(2, &[(0, 1), (0, 2)], Heading::Left),
    ];
    // Clockwise from left is up, which holds the head of snake 2.
    assert_eq!(resolve(&board, &mut snakes, 1), TickOutcome::Moved);
    assert_eq!(snakes[1].heading(), Heading::Down);
    assert_eq!(snakes[1].head(), Cell::new(2, 1));
}

#[test]
fn test_face_off_without_any_turn_is_blocked() {
    let board = Board::new(3, 3);
    let mut snakes = vec![
        Snake::build(0, &[(1, 0)], Heading::Right),
        Snake::build(1, &[(1, 1), (1, 2), (0, 2)], Heading::Left),
        Snake::build(2, &[(0, 1), (0, 0)], Heading::Right),
        Snake::build(3, &[(2, 1), (2, 0)], Heading::Right),
    ];
    let before = snakes.clone();
    assert_eq!(resolve(&board, &mut snakes, 1), TickOutcome::Blocked);
    assert_eq!(snakes, before);
}

#[test]
fn test_turn_into_a_tail_blocks_without_changing_anything() {
    let board = Board::new(3, 3);
    let mut snakes = vec![
        Snake::build(0, &[(1, 0)], Heading::Right),
        Snake::build(1, &[(1, 1), (1, 2)], Heading::Left),
        // Its tail sits right above snake 1.
        Snake::build(2, &[(0, 2), (0, 1)], Heading::Right),
        Snake::build(3, &[(2, 1), (2, 0)], Heading::Right),
    ];
    let before = snakes.clone();
    assert_eq!(resolve(&board, &mut snakes, 1), TickOutcome::Blocked);
    assert_eq!(snakes, before);
    assert_eq!(snakes[1].heading(), Heading::Left);
    assert_eq!(snakes[1].len(), 2);
}

#[test]
fn test_blocked_snake_does_not_move() {
    let board = Board::new(3, 3);
    let snakes = vec![
        Snake::build(0, &[(1, 0)], Heading::Right),
        Snake::build(1, &[(0, 1), (1, 1), (2, 1)], Heading::Up),
    ];
    let result = tick(&board, &snakes, 0);
    assert_eq!(result.outcome, TickOutcome::Blocked);
    assert_eq!(result.snakes, snakes);
}

#[test]
fn test_out_of_range_index_is_blocked() {
    let board = Board::new(3, 3);
    let snakes = vec![Snake::build(0, &[(1, 1)], Heading::Right)];
    let result = tick(&board, &snakes, 4);
    assert_eq!(result.outcome, TickOutcome::Blocked);
    assert_eq!(result.snakes, snakes);
}

#[test]
fn test_at_most_one_body_changes_per_tick() {
    use crate::generator::{Assembly, GeneratorConfig};
    use crate::progress::CancelToken;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(11);
    let config = GeneratorConfig {
        rows: 12,
        cols: 8,
        max_len: 10,
        target_coverage: 0.6,
        ..GeneratorConfig::default()
    };
    let mut assembly = Assembly::new(config, CancelToken::new());
    while !assembly.step(&mut rng) {}
    let board = assembly.board();
    let mut snakes = assembly.into_snakes();
    for _ in 0..500 {
        if snakes.is_empty() {
            break;
        }
        let index = rng.gen_range(0, snakes.len());
        let result = tick(&board, &snakes, index);
        assert!(changed_bodies(&snakes, &result.snakes) <= 1);
        if result.outcome == TickOutcome::Blocked {
            assert_eq!(result.snakes.len(), snakes.len());
        }
        snakes = result.snakes;
    }
}
