//! funkhaus-protocol – Nachrichtenformat des Signalisierungsprotokolls
//!
//! Alle Nachrichten sind JSON-Textframes mit einem `type`-Feld als Tag
//! (kebab-case). Feldnamen auf der Leitung sind camelCase (`roomId`,
//! `userId`), die Rust-Seite bleibt snake_case via serde-Renames.

pub mod signal;

pub use signal::{AusgehendeNachricht, EingehendeNachricht, RelayNachricht};
