//! Command handlers grouped by resource.

pub(crate) mod locations;
pub(crate) mod reviews;
