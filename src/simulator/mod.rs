mod cop;
mod memory;
mod processor;
mod registers;

pub use memory::*;
pub use processor::*;
pub use registers::*;
