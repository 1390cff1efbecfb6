//! Package identifier parsing.
//!
//! Turns raw package URL strings into the `(ecosystem, name, version,
//! requirement)` tuple the catalog is keyed by, and checks that version
//! requirements are well-formed before they are used to filter a range query.

pub mod error;
mod identifier;
mod purl;
mod requirement;

pub use crate::identifier::Identifier;
pub use crate::purl::PackageUrl;
pub use crate::requirement::{as_exact_version, is_valid as is_valid_requirement, validate as validate_requirement};
