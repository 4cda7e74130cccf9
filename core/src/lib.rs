#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate maplit;

pub mod color;
pub mod deadlock;
pub mod game;
pub mod generator;
pub mod grid;
pub mod progress;
pub mod resolver;
pub mod snake;
pub mod vector;
pub mod verifier;
