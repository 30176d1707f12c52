use std::cmp::Ordering;

/// Stable insertion sort with natural ordering.
///
/// # Examples
///
/// ```
/// use idoc_util::sort::insertion_sort;
///
/// let mut arr = vec![3, 1, 4, 1, 5, 9, 2, 6];
/// insertion_sort(&mut arr);
/// assert_eq!(arr, vec![1, 1, 2, 3, 4, 5, 6, 9]);
/// ```
pub fn insertion_sort<T: Ord>(arr: &mut [T]) {
    insertion_sort_by(arr, |a, b| a.cmp(b));
}

/// Stable insertion sort with a custom comparator.
///
/// Elements that compare equal keep their relative order, matching the
/// ordering guarantee of `Array.prototype.sort` in the browser.
///
/// Quadratic in the worst case. Sequence attributes hold a handful of
/// values and are usually sorted already, where this runs in linear time
/// without allocating. Reach for `slice::sort_by` on anything long.
///
/// # Examples
///
/// ```
/// use idoc_util::sort::insertion_sort_by;
///
/// let mut arr = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
/// insertion_sort_by(&mut arr, |a, b| a.0.cmp(&b.0));
/// assert_eq!(arr, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
/// ```
pub fn insertion_sort_by<T, F>(arr: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..arr.len() {
        let mut j = i;
        while j > 0 && compare(&arr[j - 1], &arr[j]) == Ordering::Greater {
            arr.swap(j - 1, j);
            j -= 1;
        }
    }
}
