pub mod generator;
pub mod handlers;
pub mod job_description;
pub mod prompts;
