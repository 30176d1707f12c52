use std::cmp::Ordering;

use idoc_util::{default_compare, insertion_sort_by, relative_index};
use serde_json::Value;

use super::property::InstanceModelProperty;
use crate::error::ModelError;

/// In-place editor for a sequence attribute of an [`InstanceModelProperty`].
///
/// Every mutating method edits the underlying array (or the `results` array
/// of a relation value) and schedules one change notification for the
/// attribute. Further edits before the scheduler runs its next turn are
/// folded into that same notification, which carries the final sequence.
///
/// Positions typed `i64` follow browser array conventions: negative values
/// count from the end and out-of-range values clamp.
pub struct SequenceMut<'a> {
    property: &'a InstanceModelProperty,
    attribute: String,
}

impl<'a> SequenceMut<'a> {
    pub(super) fn new(property: &'a InstanceModelProperty, attribute: &str) -> Self {
        Self {
            property,
            attribute: attribute.to_string(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn to_vec(&self) -> Result<Vec<Value>, ModelError> {
        self.property.read_sequence(&self.attribute)
    }

    pub fn len(&self) -> Result<usize, ModelError> {
        Ok(self.to_vec()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ModelError> {
        Ok(self.len()? == 0)
    }

    fn apply<R, F>(&self, mutate: F) -> Result<R, ModelError>
    where
        F: FnOnce(&mut Vec<Value>) -> R,
    {
        self.property.mutate_sequence(&self.attribute, mutate)
    }

    /// Appends `value`; returns the new length.
    pub fn push(&self, value: Value) -> Result<usize, ModelError> {
        self.apply(|items| {
            items.push(value);
            items.len()
        })
    }

    /// Prepends `values` keeping their order; returns the new length.
    pub fn unshift(&self, values: Vec<Value>) -> Result<usize, ModelError> {
        self.apply(|items| {
            items.splice(0..0, values);
            items.len()
        })
    }

    pub fn pop(&self) -> Result<Option<Value>, ModelError> {
        self.apply(|items| items.pop())
    }

    pub fn shift(&self) -> Result<Option<Value>, ModelError> {
        self.apply(|items| (!items.is_empty()).then(|| items.remove(0)))
    }

    /// Inserts at `index`, clamped to the sequence length.
    pub fn insert(&self, index: usize, value: Value) -> Result<(), ModelError> {
        self.apply(|items| {
            let at = index.min(items.len());
            items.insert(at, value);
        })
    }

    pub fn remove(&self, index: usize) -> Result<Option<Value>, ModelError> {
        self.apply(|items| (index < items.len()).then(|| items.remove(index)))
    }

    /// Removes `delete_count` elements from `start` (all remaining ones when
    /// `None`) and inserts `insert` in their place. Returns the removed
    /// elements.
    pub fn splice(
        &self,
        start: i64,
        delete_count: Option<usize>,
        insert: Vec<Value>,
    ) -> Result<Vec<Value>, ModelError> {
        self.apply(|items| {
            let len = items.len();
            let start = relative_index(start, len);
            let available = len - start;
            let count = delete_count.map_or(available, |n| n.min(available));
            items.splice(start..start + count, insert).collect()
        })
    }

    pub fn reverse(&self) -> Result<(), ModelError> {
        self.apply(|items| items.reverse())
    }

    /// Stable sort by the string form of each element.
    pub fn sort(&self) -> Result<(), ModelError> {
        self.sort_by(default_compare)
    }

    /// Stable sort with `compare`. Uses an insertion sort, which suits the
    /// short, mostly ordered lists held in sequence attributes.
    pub fn sort_by<F>(&self, compare: F) -> Result<(), ModelError>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        self.apply(|items| insertion_sort_by(items, compare))
    }

    /// Overwrites positions `start..end` with copies of `value`.
    pub fn fill(&self, value: Value, start: Option<i64>, end: Option<i64>) -> Result<(), ModelError> {
        self.apply(|items| {
            let len = items.len();
            let from = start.map_or(0, |s| relative_index(s, len));
            let to = end.map_or(len, |e| relative_index(e, len));
            for slot in items.iter_mut().take(to).skip(from) {
                *slot = value.clone();
            }
        })
    }

    /// Copies the elements at `start..end` over the ones starting at
    /// `target`, without changing the length.
    pub fn copy_within(
        &self,
        target: i64,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<(), ModelError> {
        self.apply(|items| {
            let len = items.len();
            let to = relative_index(target, len);
            let from = start.map_or(0, |s| relative_index(s, len));
            let until = end.map_or(len, |e| relative_index(e, len));
            let count = until.saturating_sub(from).min(len - to);
            if count > 0 {
                let source = items[from..from + count].to_vec();
                items[to..to + count].clone_from_slice(&source);
            }
        })
    }

    pub fn truncate(&self, len: usize) -> Result<(), ModelError> {
        self.apply(|items| items.truncate(len))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn messages(values: Value) -> InstanceModelProperty {
        InstanceModelProperty::new(json!({ "messages": values })).unwrap()
    }

    #[test]
    fn copy_within_matches_browser_results() {
        let cases: [(i64, Option<i64>, Option<i64>, Value); 4] = [
            (-2, None, None, json!([1, 2, 3, 1, 2])),
            (0, Some(3), None, json!([4, 5, 3, 4, 5])),
            (0, Some(3), Some(4), json!([4, 2, 3, 4, 5])),
            (-2, Some(-3), Some(-1), json!([1, 2, 3, 3, 4])),
        ];
        for (target, start, end, expected) in cases {
            let property = messages(json!([1, 2, 3, 4, 5]));
            let seq = property.sequence_mut("messages").unwrap();
            seq.copy_within(target, start, end).unwrap();
            assert_eq!(property.get("messages").unwrap(), expected);
        }
    }

    #[test]
    fn fill_matches_browser_results() {
        let cases: [(Option<i64>, Option<i64>, Value); 5] = [
            (None, None, json!([4, 4, 4])),
            (Some(1), None, json!([1, 4, 4])),
            (Some(1), Some(2), json!([1, 4, 3])),
            (Some(1), Some(1), json!([1, 2, 3])),
            (Some(-3), Some(-2), json!([4, 2, 3])),
        ];
        for (start, end, expected) in cases {
            let property = messages(json!([1, 2, 3]));
            property
                .sequence_mut("messages")
                .unwrap()
                .fill(json!(4), start, end)
                .unwrap();
            assert_eq!(property.get("messages").unwrap(), expected);
        }
    }

    #[test]
    fn splice_returns_removed_elements() {
        let property = messages(json!(["angel", "clown", "drum", "mandarin", "surgeon"]));
        let seq = property.sequence_mut("messages").unwrap();
        assert_eq!(seq.splice(3, Some(1), vec![]).unwrap(), vec![json!("mandarin")]);
        assert_eq!(seq.splice(2, Some(0), vec![json!("trumpet")]).unwrap(), Vec::<Value>::new());
        assert_eq!(
            seq.to_vec().unwrap(),
            vec![json!("angel"), json!("clown"), json!("trumpet"), json!("drum"), json!("surgeon")]
        );
        assert_eq!(seq.splice(-2, Some(1), vec![]).unwrap(), vec![json!("drum")]);
        assert_eq!(seq.splice(2, None, vec![]).unwrap(), vec![json!("trumpet"), json!("surgeon")]);
        assert_eq!(seq.to_vec().unwrap(), vec![json!("angel"), json!("clown")]);
    }

    #[test]
    fn stack_and_queue_operations() {
        let property = messages(json!([1, 2, 3]));
        let seq = property.sequence_mut("messages").unwrap();
        assert_eq!(seq.pop().unwrap(), Some(json!(3)));
        assert_eq!(seq.shift().unwrap(), Some(json!(1)));
        assert_eq!(seq.unshift(vec![json!(0), json!(1)]).unwrap(), 3);
        assert_eq!(seq.push(json!(9)).unwrap(), 4);
        assert_eq!(seq.to_vec().unwrap(), vec![json!(0), json!(1), json!(2), json!(9)]);
        seq.truncate(1).unwrap();
        assert_eq!(seq.pop().unwrap(), Some(json!(0)));
        assert_eq!(seq.pop().unwrap(), None);
        assert_eq!(seq.shift().unwrap(), None);
    }

    #[test]
    fn sort_uses_string_order_and_reverse() {
        let property = messages(json!(["cherries", "apples", "bananas"]));
        let seq = property.sequence_mut("messages").unwrap();
        seq.sort().unwrap();
        assert_eq!(seq.to_vec().unwrap(), vec![json!("apples"), json!("bananas"), json!("cherries")]);
        seq.reverse().unwrap();
        assert_eq!(seq.to_vec().unwrap(), vec![json!("cherries"), json!("bananas"), json!("apples")]);
    }

    #[test]
    fn edits_relation_results() {
        let property = InstanceModelProperty::new(json!({
            "value": {"results": ["emf:1"], "total": 1}
        }))
        .unwrap();
        property.sequence_mut("value").unwrap().push(json!("emf:2")).unwrap();
        assert_eq!(
            property.get("value").unwrap(),
            json!({"results": ["emf:1", "emf:2"], "total": 1})
        );
    }

    #[test]
    fn non_sequence_attribute_is_rejected() {
        let property = InstanceModelProperty::new(json!({"value": "text"})).unwrap();
        assert_eq!(
            property.sequence_mut("value").err(),
            Some(ModelError::NotSequence("value".to_string()))
        );
    }

    #[test]
    fn replaced_attribute_is_checked_on_each_edit() {
        let property = messages(json!([]));
        let seq = property.sequence_mut("messages").unwrap();
        property.set("messages", json!("no longer a list"));
        assert!(matches!(seq.push(json!(1)), Err(ModelError::NotSequence(_))));
    }
}
