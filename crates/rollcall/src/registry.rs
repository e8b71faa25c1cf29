//! Action registry lookup.

use rollcall_core::{ActionId, ErrorKind, EventAction};

use crate::engine::VerificationEngine;
use crate::error::{Result, VerificationError};

impl VerificationEngine {
    /// Resolve a scanned or typed action code. Exact, case-sensitive match.
    pub(crate) async fn resolve_action(&self, code: &str) -> Result<EventAction> {
        let action = self
            .stores
            .events
            .get_action_by_code(code)
            .await?
            .ok_or_else(|| {
                VerificationError::new(
                    ErrorKind::ActionNotFound,
                    format!("action not found: {}", code),
                )
            })?;
        ensure_active(action)
    }

    pub(crate) async fn load_action(&self, id: &ActionId) -> Result<EventAction> {
        let action = self.stores.events.get_action(id).await?.ok_or_else(|| {
            VerificationError::new(ErrorKind::ActionNotFound, format!("action not found: {}", id))
        })?;
        ensure_active(action)
    }
}

fn ensure_active(action: EventAction) -> Result<EventAction> {
    if !action.is_active {
        return Err(VerificationError::new(
            ErrorKind::ActionInactive,
            format!("action is not active: {}", action.name),
        ));
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{EventDayId, EventId};

    fn action(active: bool) -> EventAction {
        EventAction {
            id: ActionId::new_v4(),
            event_id: EventId::new_v4(),
            event_day_id: EventDayId::new_v4(),
            name: "Workshop A".into(),
            code: "WS-A".into(),
            is_active: active,
        }
    }

    #[test]
    fn test_inactive_action_rejected() {
        let err = ensure_active(action(false)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ActionInactive);
        assert_eq!(err.message(), "action is not active: Workshop A");
        assert!(ensure_active(action(true)).is_ok());
    }
}
