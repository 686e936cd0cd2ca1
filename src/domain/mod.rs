pub mod admin;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod media;
pub mod payments;
pub mod preferences;
mod helpers;

pub use helpers::{fake, notifier, validation};
