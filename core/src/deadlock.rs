use crate::{
    grid::{board::Board, coordinates::Cell, storage::Occupancy},
    snake::Snake,
};
use smallvec::SmallVec;

pub const PATH_LOOKAHEAD: usize = 5;

pub type Graph = Vec<SmallVec<[usize; 4]>>;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
pub enum Deadlock {
    #[display(fmt = "face-off")]
    FaceOff,
    #[display(fmt = "body block")]
    BodyBlock,
    #[display(fmt = "path intersection")]
    PathIntersection,
    #[display(fmt = "pointing cycle")]
    PointingCycle,
    #[display(fmt = "self block")]
    SelfBlock,
    #[display(fmt = "blocking cycle")]
    BlockingCycle,
}

/// What lies on the straight line from a snake's head to the board edge, every other snake
/// being static.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ExitRay {
    Clear,
    Blocked(SmallVec<[usize; 4]>),
    SelfBlocked,
}

impl ExitRay {
    pub fn is_clear(&self) -> bool {
        *self == ExitRay::Clear
    }
}

/// `index` is the owner id of `snake` in `occupancy`. An own segment only blocks if it is still
/// body, tail excepted, when the head reaches it.
pub fn exit_ray(board: &Board, snake: &Snake, index: usize, occupancy: &Occupancy) -> ExitRay {
    let head = snake.head();
    let heading = snake.heading();
    let mut blockers = SmallVec::new();
    let mut distance = 1;
    loop {
        let cell = head.ray(heading, distance);
        if !board.contains(cell) {
            break;
        }
        match occupancy.owner(cell) {
            Some(owner) if owner == index => {
                let segment = snake.segment_index(cell).unwrap_or(0);
                if segment + distance < snake.len() {
                    return ExitRay::SelfBlocked;
                }
            }
            Some(owner) => {
                if !blockers.contains(&owner) {
                    blockers.push(owner);
                }
            }
            None => {}
        }
        distance += 1;
    }
    if blockers.is_empty() {
        ExitRay::Clear
    } else {
        ExitRay::Blocked(blockers)
    }
}

pub fn has_cycle(graph: &[SmallVec<[usize; 4]>]) -> bool {
    fn visit(
        node: usize,
        graph: &[SmallVec<[usize; 4]>],
        visited: &mut [bool],
        on_stack: &mut [bool],
    ) -> bool {
        if on_stack[node] {
            return true;
        }
        if visited[node] {
            return false;
        }
        visited[node] = true;
        on_stack[node] = true;
        for target in graph[node].iter() {
            if visit(*target, graph, visited, on_stack) {
                return true;
            }
        }
        on_stack[node] = false;
        false
    }

    let mut visited = vec![false; graph.len()];
    let mut on_stack = vec![false; graph.len()];
    (0..graph.len()).any(|node| !visited[node] && visit(node, graph, &mut visited, &mut on_stack))
}

/// Straight cells ahead of the head, on the board, at most `PATH_LOOKAHEAD` of them. A first
/// step into the own tail is left out.
fn forward_path(board: &Board, snake: &Snake) -> SmallVec<[Cell; PATH_LOOKAHEAD]> {
    let mut path = SmallVec::new();
    for step in 1..=PATH_LOOKAHEAD {
        let cell = snake.head().ray(snake.heading(), step);
        if !board.contains(cell) {
            break;
        }
        if step == 1 && cell == snake.tail() {
            continue;
        }
        path.push(cell);
    }
    path
}

fn is_in_body_before_tail(snake: &Snake, cell: Cell) -> bool {
    cell != snake.tail() && snake.body().iter().take(snake.len() - 1).any(|c| *c == cell)
}

fn path_hits(board: &Board, walker: &Snake, other: &Snake) -> bool {
    forward_path(board, walker)
        .iter()
        .any(|cell| is_in_body_before_tail(other, *cell))
}

/// Edges from each on-board head to the snake whose head it points at.
fn pointing_graph(board: &Board, snakes: &[&Snake], occupancy: &Occupancy) -> Graph {
    snakes
        .iter()
        .enumerate()
        .map(|(index, snake)| {
            let mut targets = SmallVec::new();
            if snake.has_head_on_board(board) {
                let next = snake.next_head();
                if let Some(owner) = occupancy.owner(next) {
                    if owner != index && snakes[owner].head() == next {
                        targets.push(owner);
                    }
                }
            }
            targets
        })
        .collect()
}

/// Fails on a self block, otherwise returns the blocked-by graph.
fn blocking_graph(
    board: &Board,
    snakes: &[&Snake],
    occupancy: &Occupancy,
) -> Result<Graph, Deadlock> {
    snakes
        .iter()
        .enumerate()
        .map(
            |(index, snake)| match exit_ray(board, snake, index, occupancy) {
                ExitRay::Clear => Ok(SmallVec::new()),
                ExitRay::Blocked(blockers) => Ok(blockers),
                ExitRay::SelfBlocked => Err(Deadlock::SelfBlock),
            },
        )
        .collect()
}

/// Static analysis of `existing` plus `candidate`. Returns the first hazard found.
pub fn find_deadlock(board: &Board, candidate: &Snake, existing: &[Snake]) -> Option<Deadlock> {
    find_deadlock_in(
        board,
        candidate,
        existing,
        &Occupancy::from_snakes(*board, existing),
    )
}

/// Same as `find_deadlock`, `occupied` being the occupancy of `existing`.
pub fn find_deadlock_in(
    board: &Board,
    candidate: &Snake,
    existing: &[Snake],
    occupied: &Occupancy,
) -> Option<Deadlock> {
    if !candidate.has_head_on_board(board) {
        return None;
    }

    if candidate.head_to_head_target(board, existing).is_some() {
        return Some(Deadlock::FaceOff);
    }

    let next = candidate.next_head();
    if board.contains(next)
        && existing
            .iter()
            .any(|snake| is_in_body_before_tail(snake, next))
    {
        return Some(Deadlock::BodyBlock);
    }

    // Pairs of existing snakes were checked when the later one was placed.
    let path_crossed = existing
        .iter()
        .filter(|snake| snake.has_head_on_board(board))
        .any(|snake| path_hits(board, candidate, snake) || path_hits(board, snake, candidate));
    if path_crossed {
        return Some(Deadlock::PathIntersection);
    }

    let snakes: Vec<&Snake> = existing.iter().chain(std::iter::once(candidate)).collect();
    let mut occupancy = occupied.clone();
    occupancy.occupy(existing.len(), candidate);
    if has_cycle(&pointing_graph(board, &snakes, &occupancy)) {
        return Some(Deadlock::PointingCycle);
    }

    match blocking_graph(board, &snakes, &occupancy) {
        Err(deadlock) => Some(deadlock),
        Ok(graph) if has_cycle(&graph) => Some(Deadlock::BlockingCycle),
        Ok(_) => None,
    }
}

/// Whether every snake of `snakes` can leave one after the other, moving straight.
pub fn has_exit_order(board: &Board, snakes: &[Snake]) -> bool {
    let occupancy = Occupancy::from_snakes(*board, snakes);
    let snakes: Vec<&Snake> = snakes.iter().collect();
    match blocking_graph(board, &snakes, &occupancy) {
        Ok(graph) => !has_cycle(&graph),
        Err(_) => false,
    }
}

#[cfg(test)]
use crate::grid::heading::Heading;

#[test]
fn test_has_cycle() {
    use smallvec::smallvec;

    let graph: Graph = vec![smallvec![1], smallvec![2], smallvec![]];
    assert!(!has_cycle(&graph));
    let graph: Graph = vec![smallvec![1], smallvec![2], smallvec![0]];
    assert!(has_cycle(&graph));
    let graph: Graph = vec![smallvec![1, 2], smallvec![2], smallvec![], smallvec![3]];
    assert!(has_cycle(&graph));
    let graph: Graph = vec![];
    assert!(!has_cycle(&graph));
}

#[test]
fn test_two_cycle_is_a_face_off() {
    let board = Board::new(3, 3);
    let existing = vec![Snake::build(0, &[(0, 0)], Heading::Right)];
    let candidate = Snake::build(1, &[(0, 1)], Heading::Left);
    assert_eq!(
        find_deadlock(&board, &candidate, &existing),
        Some(Deadlock::FaceOff)
    );
}

#[test]
fn test_body_block() {
    let board = Board::new(3, 3);
    let existing = vec![Snake::build(0, &[(0, 1), (1, 1), (2, 1)], Heading::Up)];
    let candidate = Snake::build(1, &[(1, 0)], Heading::Right);
    assert_eq!(
        find_deadlock(&board, &candidate, &existing),
        Some(Deadlock::BodyBlock)
    );
}

#[test]
fn test_pointing_at_a_tail_is_accepted() {
    let board = Board::new(3, 3);
    let existing = vec![Snake::build(0, &[(2, 1), (1, 1), (0, 1)], Heading::Down)];
    let candidate = Snake::build(1, &[(0, 0)], Heading::Right);
    assert_eq!(find_deadlock(&board, &candidate, &existing), None);
}

#[test]
fn test_path_intersection() {
    let board = Board::new(5, 5);
    let existing = vec![Snake::build(0, &[(0, 3), (1, 3), (2, 3)], Heading::Up)];
    let candidate = Snake::build(1, &[(1, 0)], Heading::Right);
    assert_eq!(
        find_deadlock(&board, &candidate, &existing),
        Some(Deadlock::PathIntersection)
    );

    // The existing snake walks into the candidate this time.
    let existing = vec![Snake::build(0, &[(1, 0)], Heading::Right)];
    let candidate = Snake::build(1, &[(0, 3), (1, 3), (2, 3)], Heading::Up);
    assert_eq!(
        find_deadlock(&board, &candidate, &existing),
        Some(Deadlock::PathIntersection)
    );
}

#[test]
fn test_pointing_cycle() {
    let board = Board::new(3, 3);
    let existing = vec![
        Snake::build(0, &[(0, 0)], Heading::Right),
        Snake::build(1, &[(0, 1)], Heading::Down),
        Snake::build(2, &[(1, 1)], Heading::Left),
    ];
    let candidate = Snake::build(3, &[(1, 0)], Heading::Up);
    assert_eq!(
        find_deadlock(&board, &candidate, &existing),
        Some(Deadlock::PointingCycle)
    );
}

#[test]
fn test_blocking_cycle_beyond_the_lookahead() {
    let board = Board::new(3, 10);
    let existing = vec![Snake::build(0, &[(1, 0)], Heading::Right)];
    let candidate = Snake::build(1, &[(1, 9)], Heading::Left);
    assert_eq!(
        find_deadlock(&board, &candidate, &existing),
        Some(Deadlock::BlockingCycle)
    );
    assert!(!has_exit_order(&board, &[existing[0].clone(), candidate]));
}

#[test]
fn test_self_block() {
    let board = Board::new(3, 3);
    let candidate = Snake::build(0, &[(1, 1), (1, 2), (0, 2), (0, 1), (0, 0)], Heading::Up);
    assert_eq!(
        find_deadlock(&board, &candidate, &[]),
        Some(Deadlock::SelfBlock)
    );
    // One segment shorter, the cell ahead is the tail when the head gets there.
    let candidate = Snake::build(0, &[(1, 1), (1, 2), (0, 2), (0, 1)], Heading::Up);
    assert_eq!(find_deadlock(&board, &candidate, &[]), None);
}

#[test]
fn test_exit_ray() {
    let board = Board::new(4, 6);
    let snakes = vec![
        Snake::build(0, &[(1, 0)], Heading::Right),
        Snake::build(1, &[(0, 2), (1, 2), (2, 2)], Heading::Up),
        Snake::build(2, &[(1, 4), (1, 5)], Heading::Left),
        Snake::build(3, &[(3, 0), (3, 1)], Heading::Left),
    ];
    let occupancy = Occupancy::from_snakes(board, &snakes);
    match exit_ray(&board, &snakes[0], 0, &occupancy) {
        ExitRay::Blocked(blockers) => assert_eq!(
            blockers
                .into_iter()
                .collect::<std::collections::HashSet<_>>(),
            hashset![1, 2]
        ),
        other => panic!("unexpected {:?}", other),
    }
    assert!(exit_ray(&board, &snakes[1], 1, &occupancy).is_clear());
    assert!(exit_ray(&board, &snakes[3], 3, &occupancy).is_clear());
    assert!(has_exit_order(&board, &snakes));
}

#[test]
fn test_off_board_candidate_never_deadlocks() {
    let board = Board::new(3, 3);
    let existing = vec![Snake::build(0, &[(1, 2)], Heading::Right)];
    let candidate = Snake::build(1, &[(1, 3)], Heading::Left);
    assert_eq!(find_deadlock(&board, &candidate, &existing), None);
}
