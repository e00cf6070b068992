use crate::business_rules::BookingStatus;

/// Service for managing booking status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Confirmed, Canceled
    /// - Confirmed → Canceled, Completed
    /// - Completed, Canceled → none (terminal)
    ///
    /// Moving to the current status is not a transition and is rejected.
    pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
        matches!(
            (from, to),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Canceled)
                | (BookingStatus::Confirmed, BookingStatus::Canceled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else if from == to {
            Err(format!("Booking is already {}", from))
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}
