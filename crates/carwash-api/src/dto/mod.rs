//! Data Transfer Objects (DTOs) for API requests and responses

pub mod booking;
pub mod common;
pub mod contract;
pub mod invoice;
pub mod location;
pub mod notification;
pub mod payment;
pub mod slot;

pub use booking::*;
pub use common::*;
pub use contract::*;
pub use invoice::*;
pub use location::*;
pub use notification::*;
pub use payment::*;
pub use slot::*;
