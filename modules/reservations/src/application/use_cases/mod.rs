mod cancel_reservation_use_case;
mod checkout_use_case;
mod get_availability_use_case;
mod get_reservation_use_case;
mod submit_reservation_use_case;

pub use cancel_reservation_use_case::CancelReservationUseCase;
pub use checkout_use_case::CheckoutUseCase;
pub use get_availability_use_case::GetAvailabilityUseCase;
pub use get_reservation_use_case::GetReservationUseCase;
pub use submit_reservation_use_case::{SubmitReservationUseCase, SubmitSettings};
