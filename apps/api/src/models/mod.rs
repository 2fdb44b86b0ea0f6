pub mod application;
pub mod resume;
pub mod selection;
pub mod version;
