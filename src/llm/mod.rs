pub mod client;
pub mod mock;
pub mod oracle;
pub mod prompts;
pub mod validation;

pub use client::*;
pub use mock::*;
pub use oracle::*;
pub use prompts::*;
pub use validation::*;
