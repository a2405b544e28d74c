pub mod bus;
pub mod mock;

pub use bus::{SessionEventBus, DEFAULT_CAPACITY};
pub use mock::{MockTransport, PromptScript};
