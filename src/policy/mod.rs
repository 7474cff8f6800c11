//! Cache replacement policies.

pub mod adaptive;
