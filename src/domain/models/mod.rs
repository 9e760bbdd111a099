pub mod artifact;
pub mod object;

pub use artifact::{run_request_key, PromptExample, RunRequest};
pub use object::*;
