pub mod board;
pub mod coordinates;
pub mod heading;
pub mod storage;
