// Bus topic names, fixed for the sale window

/// Reservation requests, keyed by SKU.
pub const RESERVATION_REQUESTS: &str = "reservation-requests";

/// Reservation lifecycle events, keyed by SKU.
pub const RESERVATION_EVENTS: &str = "reservation-events";

/// Poison batches parked for human inspection.
pub const RESERVATION_REQUESTS_DLQ: &str = "reservation-requests-dlq";
