pub mod csv;
pub mod display;
pub mod prompt;
