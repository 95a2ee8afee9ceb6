pub mod element;
pub mod locator;
pub mod session;

pub use session::{ImplicitWaitGuard, Session, SessionManager, SessionSettings, Timeouts};
