use uuid::Uuid;

/// Outcome of a settlement attempt for one order.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Approved { provider_ref: String },
    Refused { reason: String },
}

/// Capability interface for charging an order at checkout.
///
/// Settlement runs inside the checkout transaction: a refusal rolls the whole
/// unit of work back, reserved stock included.
pub trait Settlement: Send + Sync {
    fn authorize(&self, amount: f32, method: &str) -> SettlementOutcome;
}

/// Demo gateway that approves every charge instantly.
pub struct InstantApproval;

impl Settlement for InstantApproval {
    fn authorize(&self, _amount: f32, _method: &str) -> SettlementOutcome {
        SettlementOutcome::Approved {
            provider_ref: format!("demo-{}", Uuid::new_v4()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_approval_always_approves() {
        let outcome = InstantApproval.authorize(10.0, "pix");
        assert!(matches!(outcome, SettlementOutcome::Approved { .. }));
    }

    #[test]
    fn provider_refs_are_unique_per_charge() {
        let SettlementOutcome::Approved { provider_ref: a } =
            InstantApproval.authorize(10.0, "pix")
        else {
            panic!("expected approval");
        };
        let SettlementOutcome::Approved { provider_ref: b } =
            InstantApproval.authorize(10.0, "pix")
        else {
            panic!("expected approval");
        };
        assert_ne!(a, b);
    }
}
