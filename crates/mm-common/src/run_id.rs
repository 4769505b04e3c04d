//! ULID identifiers.
//!
//! `get` is fixed for the lifetime of the process and tags startup and
//! shutdown logs; `generate` mints a fresh id for every served computation.

use once_cell::sync::Lazy;
use ulid::Ulid;

static PROCESS_RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

#[inline]
pub fn get() -> &'static str {
    &PROCESS_RUN_ID
}

#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}
