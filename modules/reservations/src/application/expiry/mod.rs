mod expiry_reconciler;

pub use expiry_reconciler::{ExpiryReconciler, SweepReport};
