//! funkhaus-core – Gemeinsame Typen
//!
//! Haelt die Typen die von mehreren Workspace-Crates gebraucht werden.
//! Bewusst klein gehalten: Raum-Schluessel und User-IDs sind im Protokoll
//! opake Strings und bekommen keinen eigenen Typ.

pub mod types;

pub use types::ConnectionId;
