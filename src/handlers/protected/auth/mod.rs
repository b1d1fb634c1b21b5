pub mod access;
pub mod session;

pub use access::access_check;
pub use session::{logout, whoami};
