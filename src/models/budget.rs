use rust_decimal::Decimal;

/// The user's monthly spending limit. One value per user, independent of
/// month. Zero means tracking is disabled, not "0% used".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Budget {
    amount: Decimal,
}

impl Budget {
    pub(crate) fn new(amount: Decimal) -> Result<Budget, String> {
        if amount < Decimal::ZERO {
            return Err(format!("Budget cannot be negative, got {amount}"));
        }
        Ok(Budget { amount })
    }

    pub(crate) fn disabled() -> Budget {
        Budget::default()
    }

    pub(crate) fn amount(&self) -> Decimal {
        self.amount
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}
