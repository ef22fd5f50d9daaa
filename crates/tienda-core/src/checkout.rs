//! # Checkout Planning
//!
//! Pure half of the checkout transaction: given the lines read inside the
//! transaction, decide whether the sale may proceed and compute its totals.
//! The database layer performs the writes.
//!
//! ## Precondition Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lines ──► 1. any lines?            no ──► EmptyCart                    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │            2. every product active?  no ──► ProductInactive             │
//! │               every line in stock?   no ──► InsufficientStock           │
//! │              │                                                          │
//! │              ▼                                                          │
//! │            3. payment method known?  no ──► InvalidPaymentMethod        │
//! │              │                                                          │
//! │              ▼                                                          │
//! │            CheckoutPlan { subtotal, tax, total }                        │
//! │                                                                         │
//! │  The first failing check wins; later checks are not evaluated.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tax Rule
//! `subtotal = Σ unit_price × quantity` (exact, in cents),
//! `tax = subtotal × rate` rounded half-up once, `total = subtotal + tax`.
//! Cart summaries, checkouts and direct sales all use this rule.

use serde::Serialize;

use crate::cart::CartLine;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, TaxRate};

/// The outcome of a successful precondition check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPlan {
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Checks checkout preconditions in order and computes totals.
///
/// ## Example
/// ```rust
/// use tienda_core::cart::CartLine;
/// use tienda_core::checkout::plan_checkout;
/// use tienda_core::types::{RecordStatus, TaxRate};
///
/// let lines = vec![CartLine {
///     product_id: "p1".into(),
///     sku: "ARZ".into(),
///     name: "Arroz".into(),
///     unit_price_cents: 1000,
///     quantity: 3,
///     available_stock: 5,
///     product_status: RecordStatus::Active,
/// }];
///
/// let plan = plan_checkout(&lines, "cash", TaxRate::IGV).unwrap();
/// assert_eq!(plan.subtotal.cents(), 3000);
/// assert_eq!(plan.tax.cents(), 540);
/// assert_eq!(plan.total.cents(), 3540);
/// ```
pub fn plan_checkout(
    lines: &[CartLine],
    payment_method: &str,
    tax_rate: TaxRate,
) -> CoreResult<CheckoutPlan> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    for line in lines {
        check_line(line)?;
    }

    let payment_method: PaymentMethod = payment_method.parse()?;

    let subtotal: Money = lines.iter().map(CartLine::subtotal).sum();
    let tax = subtotal.calculate_tax(tax_rate);

    Ok(CheckoutPlan {
        lines: lines.to_vec(),
        payment_method,
        subtotal,
        tax,
        total: subtotal + tax,
    })
}

/// Checks a single line against its product's current state.
pub fn check_line(line: &CartLine) -> CoreResult<()> {
    if !line.product_status.is_active() {
        return Err(CoreError::ProductInactive {
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
        });
    }

    if !line.has_enough_stock() {
        return Err(CoreError::InsufficientStock {
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
            available: line.available_stock,
            requested: line.quantity,
        });
    }

    Ok(())
}

/// Merges repeated product ids, summing quantities. First-seen order is kept.
///
/// ```rust
/// use tienda_core::checkout::merge_lines;
///
/// let merged = merge_lines(&[("a".into(), 1), ("b".into(), 2), ("a".into(), 3)]);
/// assert_eq!(merged, vec![("a".to_string(), 4), ("b".to_string(), 2)]);
/// ```
pub fn merge_lines(requested: &[(String, i64)]) -> Vec<(String, i64)> {
    let mut merged: Vec<(String, i64)> = Vec::with_capacity(requested.len());
    for (product_id, quantity) in requested {
        match merged.iter_mut().find(|(id, _)| id == product_id) {
            Some((_, total)) => *total += quantity,
            None => merged.push((product_id.clone(), *quantity)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordStatus;

    fn line(id: &str, price: i64, qty: i64, stock: i64) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            sku: id.to_uppercase(),
            name: format!("Product {}", id),
            unit_price_cents: price,
            quantity: qty,
            available_stock: stock,
            product_status: RecordStatus::Active,
        }
    }

    #[test]
    fn test_empty_cart_checked_first() {
        let err = plan_checkout(&[], "not-a-method", TaxRate::IGV).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_stock_checked_before_payment_method() {
        let lines = vec![line("a", 1000, 6, 5)];
        let err = plan_checkout(&lines, "not-a-method", TaxRate::IGV).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => {
                assert_eq!(product_id, "a");
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_first_short_line_is_reported() {
        let lines = vec![line("a", 100, 1, 5), line("b", 100, 3, 2), line("c", 100, 9, 0)];
        let err = plan_checkout(&lines, "cash", TaxRate::IGV).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { ref product_id, .. } if product_id == "b"));
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut l = line("a", 1000, 1, 5);
        l.product_status = RecordStatus::Inactive;
        let err = plan_checkout(&[l], "cash", TaxRate::IGV).unwrap_err();
        assert!(matches!(err, CoreError::ProductInactive { .. }));
    }

    #[test]
    fn test_invalid_payment_method() {
        let lines = vec![line("a", 1000, 1, 5)];
        let err = plan_checkout(&lines, "bitcoin", TaxRate::IGV).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentMethod(_)));
    }

    #[test]
    fn test_exact_stock_is_enough() {
        let lines = vec![line("a", 1000, 5, 5)];
        assert!(plan_checkout(&lines, "card", TaxRate::IGV).is_ok());
    }

    #[test]
    fn test_totals_follow_canonical_rule() {
        let lines = vec![line("a", 1999, 3, 10), line("b", 455, 7, 10)];
        let plan = plan_checkout(&lines, "yape", TaxRate::IGV).unwrap();

        let subtotal = 1999 * 3 + 455 * 7; // 9182
        assert_eq!(plan.subtotal.cents(), subtotal);
        assert_eq!(plan.tax.cents(), (subtotal * 1800 + 5000) / 10000);
        assert_eq!(plan.total.cents(), (subtotal * 118 + 50) / 100);
        assert_eq!(plan.payment_method, PaymentMethod::Yape);
    }

    #[test]
    fn test_merge_lines_sums_duplicates() {
        let merged = merge_lines(&[
            ("x".to_string(), 2),
            ("x".to_string(), 2),
            ("y".to_string(), 1),
        ]);
        assert_eq!(merged, vec![("x".to_string(), 4), ("y".to_string(), 1)]);
    }
}
