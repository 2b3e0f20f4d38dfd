//! Domain layer: entities, value objects, pure loan math and the ports the
//! application layer depends on.

pub mod amortization;
pub mod application;
pub mod bank;
pub mod money;
pub mod ports;
pub mod property;
pub mod rate;
pub mod scenario;
