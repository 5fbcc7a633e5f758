mod measurement;
mod sensors_config;
mod station;
mod time_range;

pub use measurement::*;
pub use sensors_config::*;
pub use station::*;
pub use time_range::*;
