pub mod constants;
pub mod parsing;
pub mod progress;

pub use constants::*;
pub use parsing::{date_from_cell, number_from_cell, parse_date, parse_number};
pub use progress::ProgressReporter;
