pub mod day;
pub mod mask;
pub mod policy;
pub mod registers;
pub mod series;
pub mod snapshot;
