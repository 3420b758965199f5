pub mod calc;
pub mod classes;
pub mod core;
pub mod exchange;
pub mod gradescale;
