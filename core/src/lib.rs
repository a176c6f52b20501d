//! Core utilities and shared types for the toolbox engine.

pub mod sources;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Host as typed by the user, before any resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(pub String);

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target(s.to_string())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
