mod addresses;
mod health;
mod instance_types;
mod instances;
mod ws;

pub use addresses::*;
pub use health::*;
pub use instance_types::*;
pub use instances::*;
pub use ws::*;
