pub mod pressure;
pub mod preview;
pub mod simulate;
pub mod sweep;
