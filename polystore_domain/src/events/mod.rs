//! Domain events: immutable records of significant occurrences (spec §4.5
//! step 5, "the saga emits a `completed` event").

mod saga_events;

pub use saga_events::SagaEvent;
