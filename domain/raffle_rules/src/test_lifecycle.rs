use crate::error::RuleError;
use crate::lifecycle::{
    can_transition_raffle, check_purchase_transition, check_raffle_transition, has_role, HasRole,
};
use crate::types::{PurchaseStatus, RaffleStatus, Role};

const ALL_RAFFLE: [RaffleStatus; 5] = [
    RaffleStatus::Draft,
    RaffleStatus::Active,
    RaffleStatus::Finished,
    RaffleStatus::Cancelled,
    RaffleStatus::Postponed,
];

#[test]
fn test_terminal_raffles_accept_nothing() {
    for to in ALL_RAFFLE {
        assert!(!can_transition_raffle(RaffleStatus::Finished, to));
        assert!(!can_transition_raffle(RaffleStatus::Cancelled, to));
    }
}

#[test]
fn test_raffle_forward_transitions() {
    assert!(can_transition_raffle(RaffleStatus::Draft, RaffleStatus::Active));
    assert!(can_transition_raffle(RaffleStatus::Active, RaffleStatus::Finished));
    assert!(can_transition_raffle(RaffleStatus::Active, RaffleStatus::Postponed));
    assert!(can_transition_raffle(RaffleStatus::Postponed, RaffleStatus::Active));
    assert!(can_transition_raffle(RaffleStatus::Postponed, RaffleStatus::Cancelled));
}

#[test]
fn test_raffle_cannot_skip_activation() {
    assert_eq!(
        check_raffle_transition(RaffleStatus::Draft, RaffleStatus::Finished),
        Err(RuleError::InvalidRaffleTransition {
            from: RaffleStatus::Draft,
            to: RaffleStatus::Finished,
        })
    );
    assert!(check_raffle_transition(RaffleStatus::Postponed, RaffleStatus::Finished).is_err());
    assert!(check_raffle_transition(RaffleStatus::Active, RaffleStatus::Draft).is_err());
}

#[test]
fn test_no_self_transitions() {
    for status in ALL_RAFFLE {
        assert!(!can_transition_raffle(status, status), "{status} -> {status}");
    }
}

#[test]
fn test_purchase_transitions() {
    assert!(check_purchase_transition(PurchaseStatus::Pending, PurchaseStatus::Confirmed).is_ok());
    assert!(check_purchase_transition(PurchaseStatus::Pending, PurchaseStatus::Rejected).is_ok());
    assert!(check_purchase_transition(PurchaseStatus::Confirmed, PurchaseStatus::Rejected).is_err());
    assert!(check_purchase_transition(PurchaseStatus::Rejected, PurchaseStatus::Confirmed).is_err());
    assert!(check_purchase_transition(PurchaseStatus::Pending, PurchaseStatus::Pending).is_err());
}

struct Operator {
    role: Role,
}

impl HasRole for Operator {
    fn role(&self) -> Role {
        self.role
    }
}

#[test]
fn test_has_role() {
    let admin = Operator { role: Role::Admin };
    let user = Operator { role: Role::User };

    assert!(has_role(&admin, Role::Admin));
    assert!(!has_role(&user, Role::Admin));
    assert!(has_role(&Role::User, Role::User));
}
