use crate::error::AppError;
use crate::models::order::OrderStatus;

use OrderStatus::{Cancelled, Delivered, OutForDelivery, Pending, PendingPayment, ReadyForDelivery};

/// Allowed `(from, to)` status changes. Terminal states have no outgoing edges.
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (PendingPayment, &[Pending, Cancelled]),
    (Pending, &[ReadyForDelivery, Cancelled]),
    (ReadyForDelivery, &[OutForDelivery, Pending, Cancelled]),
    (OutForDelivery, &[Delivered, ReadyForDelivery, Cancelled]),
    (Delivered, &[]),
    (Cancelled, &[]),
];

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .is_some_and(|(_, targets)| targets.contains(&to))
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "cannot move order from {} to {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{can_transition, check_transition};
    use crate::models::order::OrderStatus::*;

    #[test]
    fn happy_path_is_allowed() {
        assert!(can_transition(PendingPayment, Pending));
        assert!(can_transition(Pending, ReadyForDelivery));
        assert!(can_transition(ReadyForDelivery, OutForDelivery));
        assert!(can_transition(OutForDelivery, Delivered));
    }

    #[test]
    fn every_non_terminal_state_can_cancel() {
        for from in [PendingPayment, Pending, ReadyForDelivery, OutForDelivery] {
            assert!(can_transition(from, Cancelled), "{from:?} should cancel");
        }
    }

    #[test]
    fn terminal_states_are_final() {
        for to in [PendingPayment, Pending, ReadyForDelivery, OutForDelivery, Delivered, Cancelled] {
            assert!(!can_transition(Delivered, to));
            assert!(!can_transition(Cancelled, to));
        }
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert!(check_transition(PendingPayment, OutForDelivery).is_err());
        assert!(check_transition(Pending, Delivered).is_err());
    }
}
