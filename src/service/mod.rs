//! Business operations between the HTTP handlers and the stores.

pub mod campaigns;
pub mod permissions;
