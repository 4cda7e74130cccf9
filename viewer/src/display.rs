use arrows_core::{
    color::Color,
    grid::{board::Board, heading::Heading, storage::BoardStorage},
    snake::Snake,
};
use itertools::Itertools;

fn head_glyph(heading: Heading) -> char {
    match heading {
        Heading::Up => '^',
        Heading::Down => 'v',
        Heading::Left => '<',
        Heading::Right => '>',
    }
}

fn body_glyph(color: Color) -> char {
    match color {
        Color::Red => 'r',
        Color::Green => 'g',
        Color::Blue => 'b',
        Color::Yellow => 'y',
        Color::Magenta => 'm',
        Color::Cyan => 'c',
    }
}

/// One line per row, `.` for free cells. Cells outside the board are not drawn.
pub fn render(board: Board, snakes: &[Snake]) -> String {
    let mut glyphs = BoardStorage::new(board);
    for snake in snakes {
        for (index, cell) in snake.body().iter().enumerate() {
            let glyph = if index == 0 {
                head_glyph(snake.heading())
            } else {
                body_glyph(snake.color())
            };
            glyphs.insert(*cell, glyph);
        }
    }
    if board.area() == 0 {
        return String::new();
    }
    let rows = board
        .cells()
        .map(|cell| glyphs.get(cell).copied().unwrap_or('.'))
        .chunks(board.cols());
    let text = rows.into_iter().map(|row| row.collect::<String>()).join("\n");
    text
}

#[cfg(test)]
use arrows_core::{grid::coordinates::Cell, snake::SnakeId};

#[test]
fn test_render() {
    let snakes = vec![
        Snake::new(
            SnakeId(0),
            vec![Cell::new(0, 1), Cell::new(0, 0)],
            Color::Green,
        )
        .unwrap(),
        Snake::new(
            SnakeId(1),
            vec![Cell::new(2, 2), Cell::new(1, 2), Cell::new(1, 3)],
            Color::Blue,
        )
        .unwrap(),
        Snake::new(SnakeId(2), vec![Cell::new(-1, 0)], Color::Red).unwrap(),
    ];
    assert_eq!(
        render(Board::new(3, 4), &snakes),
        "g>..\n..bb\n..v."
    );
}
