pub mod error;
pub mod scripted;
pub mod simulated;
pub mod traits;

pub use error::{ProviderError, Result};
pub use scripted::{ProviderCall, ScriptedProvider};
pub use simulated::{SimulatedConfig, SimulatedInstance, SimulatedProvider};
pub use traits::InstanceProvider;
