mod async_state;
mod executor;

pub use async_state::AsyncResponseState;
pub use executor::*;
