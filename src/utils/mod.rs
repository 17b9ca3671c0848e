pub mod format;
pub mod settlement;
pub mod sheet;
pub mod week;
