//! Repository ports: abstractions over durable persistence, hiding storage
//! technology from the domain (spec §4.5, §6 "Durable log format").

mod saga_log;

pub use saga_log::SagaLog;
