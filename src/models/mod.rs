pub mod conflict;
pub mod session;
pub mod slot;

pub use conflict::*;
pub use session::*;
pub use slot::*;
