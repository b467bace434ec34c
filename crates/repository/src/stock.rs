//! Inventory arithmetic used when an order is placed.

/// Units left after an order line, or `None` if the shop cannot cover it.
///
/// Stock never goes below zero.
pub(crate) fn remaining_stock(available: i64, ordered: i64) -> Option<i64> {
    available.checked_sub(ordered).filter(|left| *left >= 0)
}
