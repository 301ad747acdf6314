//! Command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod ls;
pub(crate) mod seed;
pub(crate) mod validate;
