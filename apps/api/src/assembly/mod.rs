pub mod finalize;
pub mod handlers;
pub mod merge;
pub mod selection;
