//! Proptest generators for property-based testing.

use proptest::prelude::*;
use uuid::Uuid;

use rollcall_core::{ParticipantId, PaymentStatus};

/// Generate a random participant id.
pub fn participant_id() -> impl Strategy<Value = ParticipantId> {
    any::<u128>().prop_map(|bits| ParticipantId::from_uuid(Uuid::from_u128(bits)))
}

pub fn payment_status() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Unpaid),
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Paid),
    ]
}

/// Ticket price in minor units, zero (free) about a third of the time.
pub fn ticket_price() -> impl Strategy<Value = u64> {
    prop_oneof![
        1 => Just(0u64),
        2 => 1u64..=10_000_000,
    ]
}

/// A credential in path form, `<dirs>/<uuid>.<ext>`, with either separator.
pub fn path_credential(id: ParticipantId) -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z0-9_]{1,12}", 0..4),
        prop_oneof![Just('/'), Just('\\')],
        "(png|jpg|jpeg|svg)",
    )
        .prop_map(move |(dirs, sep, ext)| {
            let mut path = String::new();
            for dir in dirs {
                path.push_str(&dir);
                path.push(sep);
            }
            path.push_str(&format!("{}.{}", id, ext));
            path
        })
}

/// Any accepted credential for `id`: path form or bare, maybe padded.
pub fn credential_for(id: ParticipantId) -> impl Strategy<Value = String> {
    let form = prop_oneof![path_credential(id), Just(id.to_string())];
    (form, "[ \t]{0,2}", "[ \t\n]{0,2}")
        .prop_map(|(credential, lead, trail)| format!("{}{}{}", lead, credential, trail))
}

/// Text that never decodes to a participant id.
pub fn garbage_credential() -> impl Strategy<Value = String> {
    "[g-z !#%&*+=?@]{1,48}"
}

/// Parameters for a single-redemption scenario.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub ticket_price: u64,
    pub payment_status: PaymentStatus,
    /// Event day relative to today, in days. Never `1`: that day can turn
    /// into today between building a fixture and verifying against it.
    pub day_offset: i64,
}

impl ScenarioParams {
    /// Whether a redemption under these parameters should be admitted.
    pub fn admissible(&self) -> bool {
        let paid_ok = self.ticket_price == 0 || self.payment_status == PaymentStatus::Paid;
        paid_ok && self.day_offset <= 0
    }
}

impl Arbitrary for ScenarioParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let day_offset = prop_oneof![-3i64..=0, 2i64..=3];
        (ticket_price(), payment_status(), day_offset)
            .prop_map(|(ticket_price, payment_status, day_offset)| ScenarioParams {
                ticket_price,
                payment_status,
                day_offset,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::resolve_credential;

    proptest! {
        #[test]
        fn prop_generated_credentials_resolve(
            (id, credential) in participant_id()
                .prop_flat_map(|id| (Just(id), credential_for(id)))
        ) {
            prop_assert_eq!(resolve_credential(&credential).unwrap(), id);
        }

        #[test]
        fn prop_scenario_day_is_never_tomorrow(params in any::<ScenarioParams>()) {
            prop_assert_ne!(params.day_offset, 1);
            prop_assert!((-3..=3).contains(&params.day_offset));
        }

        #[test]
        fn prop_garbage_rejected(raw in garbage_credential()) {
            prop_assert!(resolve_credential(&raw).is_err());
        }
    }
}
