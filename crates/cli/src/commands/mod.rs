pub mod check;
pub mod exports;
pub mod report;

pub use check::*;
pub use exports::*;
pub use report::*;
