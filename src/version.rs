// Crate identity, captured from Cargo metadata at build time

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `name/version`, sent by the health prober.
pub fn user_agent() -> String {
    format!("{NAME}/{VERSION}")
}
