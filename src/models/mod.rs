pub mod task;
pub mod checklist;
pub mod dependency;
pub mod stats;

pub use task::*;
pub use checklist::*;
pub use dependency::*;
pub use stats::*;
