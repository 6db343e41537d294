pub mod controller;
pub mod keys;
pub mod session;

pub use controller::{ReaderController, Ticket};
pub use keys::ReaderKey;
pub use session::{Position, ReaderSession, ReadingMode, Step, Zoom};
