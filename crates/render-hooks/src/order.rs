//! Invocation ordering shared by all pluggable artifacts

/// Order used when an artifact does not declare one.
pub const DEFAULT_INVOCATION_ORDER: i32 = 1000;

/// Artifacts run in ascending invocation order; equal orders keep discovery order.
pub trait InvocationOrdered {
    /// Position of this artifact relative to its peers.
    fn invocation_order(&self) -> i32 {
        DEFAULT_INVOCATION_ORDER
    }
}

/// Stable sort by invocation order.
pub(crate) fn sort_by_invocation_order<T, F>(items: &mut [T], order: F)
where
    F: Fn(&T) -> i32,
{
    items.sort_by_key(|item| order(item));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Sorting keeps discovery order among artifacts with equal order.
        #[test]
        fn prop_sort_is_stable(orders in prop::collection::vec(0i32..5, 0..40)) {
            let mut items: Vec<(i32, usize)> =
                orders.iter().copied().enumerate().map(|(i, o)| (o, i)).collect();
            sort_by_invocation_order(&mut items, |item| item.0);

            for pair in items.windows(2) {
                prop_assert!(pair[0].0 <= pair[1].0);
                if pair[0].0 == pair[1].0 {
                    prop_assert!(pair[0].1 < pair[1].1);
                }
            }
        }
    }
}
