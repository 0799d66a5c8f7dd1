pub mod canonical;
pub mod settings;

pub use canonical::{canonical_json_bytes, canonical_json_string, payload_hash};
pub use settings::Settings;
