pub mod classify;
pub mod session;
pub mod status;
