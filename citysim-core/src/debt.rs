//! Municipal bond ledger. Issuance is external (not in scope); this
//! module only amortizes and retires items inserted by the caller.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct DebtItem {
    pub balance: i32,
    pub daily_payment: i32,
    pub apr_basis_points: i32,
    pub days_left: i32,
}

impl DebtItem {
    pub fn is_retired(&self) -> bool {
        self.balance <= 0 || self.days_left <= 0
    }
}

/// Outcome of one day's amortization across the whole ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebtServiceResult {
    pub interest_accrued: i32,
    pub principal_paid: i32,
    pub items_retired: u32,
}

/// Amortize every item in `debts` by one day, in place, removing retired
/// items. `daily_payment` always reduces `balance`; on the last day of an
/// item's term, the full remaining balance is paid instead.
pub fn service_debts(debts: &mut Vec<DebtItem>) -> DebtServiceResult {
    let mut result = DebtServiceResult::default();

    for item in debts.iter_mut() {
        if item.is_retired() {
            continue;
        }

        // ceil(balance * apr_bp / (10000 * 365))
        let interest = ((item.balance as i64) * (item.apr_basis_points as i64))
            .div_ceil(10_000 * 365) as i32;
        item.balance = item.balance.saturating_add(interest);
        result.interest_accrued = result.interest_accrued.saturating_add(interest);

        let paying_off_today = item.days_left <= 1;
        let payment = if paying_off_today {
            item.balance
        } else {
            item.daily_payment.min(item.balance)
        };

        item.balance = item.balance.saturating_sub(payment);
        result.principal_paid = result.principal_paid.saturating_add(payment);
        item.days_left = item.days_left.saturating_sub(1);
    }

    let before = debts.len();
    debts.retain(|d| !d.is_retired());
    result.items_retired = (before - debts.len()) as u32;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interest_loan_amortizes_to_exactly_zero() {
        let mut debts = vec![DebtItem {
            balance: 365,
            daily_payment: 1,
            apr_basis_points: 0,
            days_left: 365,
        }];

        let mut total_paid = 0i64;
        for _ in 0..365 {
            let r = service_debts(&mut debts);
            total_paid += r.principal_paid as i64;
        }

        assert!(debts.is_empty());
        assert_eq!(total_paid, 365);
    }

    #[test]
    fn last_day_pays_off_full_remaining_balance() {
        let mut debts = vec![DebtItem {
            balance: 500,
            daily_payment: 10,
            apr_basis_points: 0,
            days_left: 1,
        }];
        let r = service_debts(&mut debts);
        assert_eq!(r.principal_paid, 500);
        assert!(debts.is_empty());
        assert_eq!(r.items_retired, 1);
    }

    #[test]
    fn interest_accrues_before_payment() {
        let mut debts = vec![DebtItem {
            balance: 10_000,
            daily_payment: 0,
            apr_basis_points: 3650, // 36.5% APR -> 0.1%/day at 365-day basis
            days_left: 30,
        }];
        let r = service_debts(&mut debts);
        assert_eq!(r.interest_accrued, 10); // ceil(10000*3650/3650000) = 10
        assert_eq!(debts[0].balance, 10_010);
    }

    #[test]
    fn sum_of_payments_covers_initial_balance() {
        let mut debts = vec![DebtItem {
            balance: 1_000,
            daily_payment: 50,
            apr_basis_points: 0,
            days_left: 20,
        }];
        let mut total_paid = 0i64;
        for _ in 0..20 {
            let r = service_debts(&mut debts);
            total_paid += r.principal_paid as i64;
        }
        assert!(total_paid >= 1_000);
        assert!(debts.is_empty());
    }
}
