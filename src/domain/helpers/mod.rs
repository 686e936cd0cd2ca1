pub mod fake;
mod macros;
pub mod notifier;
pub mod validation;
