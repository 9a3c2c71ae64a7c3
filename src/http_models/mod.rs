// Request payloads and response bodies, one file per route group.

pub mod itinerary;
pub mod poi;
pub mod recommendation;
pub mod stream;
