use rand::{seq::SliceRandom, Rng};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
}

pub const COLORS: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
];

impl Color {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *COLORS.choose(rng).unwrap_or(&Color::Red)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::Red
    }
}
