//! Typed entry points for the backend resource namespaces.
//!
//! - `SuperAdminApi`: clinics and clinic administrators (`/super-admin`)
//! - `AdminApi`: doctors, slots, appointments, patient history (`/admin`)
//! - `PublicApi`: unauthenticated lookups (`/public`)
//!
//! Payloads stay as `serde_json::Value`; their shape belongs to the backend.

pub mod admin;
pub mod public;
pub mod slots;
pub mod superadmin;

pub use admin::AdminApi;
pub use public::PublicApi;
pub use slots::{SlotGeneration, ValidationError};
pub use superadmin::SuperAdminApi;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Check a resource id before it is spliced into a path.
pub(crate) fn id_segment(id: &str) -> Result<&str, ApiError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ApiError::InvalidRequest(format!("invalid resource id: {:?}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_segment() {
        assert_eq!(id_segment("65f1c0a2b3").unwrap(), "65f1c0a2b3");
        assert_eq!(id_segment("doc_12-a").unwrap(), "doc_12-a");
        assert!(id_segment("").is_err());
        assert!(id_segment("../admins").is_err());
        assert!(id_segment("a b").is_err());
    }
}
