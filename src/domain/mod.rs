//! Domain modules (vertical slices): types, wire types, service clients.

pub mod headline;
pub mod image;
pub mod pinning;
