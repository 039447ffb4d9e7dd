//! Optimistic updates: show the predicted state now, settle it later.

/// A local mutation applied before the backend confirms it.
///
/// `apply` writes the predicted value into the target and remembers the
/// original. The command then has to end in exactly one of `commit` (keep
/// the prediction) or `rollback` (write the original back).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an applied optimistic command must be committed or rolled back"]
pub struct Optimistic<T> {
    original: T,
    predicted: T,
}

impl<T: Clone> Optimistic<T> {
    pub fn apply(target: &mut T, predicted: T) -> Self {
        let original = std::mem::replace(target, predicted.clone());
        Self {
            original,
            predicted,
        }
    }

    /// Build the prediction from the current value, then apply it.
    pub fn apply_with(target: &mut T, predict: impl FnOnce(&T) -> T) -> Self {
        let predicted = predict(target);
        Self::apply(target, predicted)
    }

    pub fn original(&self) -> &T {
        &self.original
    }

    pub fn predicted(&self) -> &T {
        &self.predicted
    }

    pub fn commit(self) -> T {
        self.predicted
    }

    pub fn rollback(self, target: &mut T) -> T {
        std::mem::replace(target, self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_original_exactly() {
        let mut value = vec![1, 2, 3];
        let command = Optimistic::apply_with(&mut value, |v| {
            let mut next = v.clone();
            next.push(4);
            next
        });
        assert_eq!(value, vec![1, 2, 3, 4]);

        let discarded = command.rollback(&mut value);
        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(discarded, vec![1, 2, 3, 4]);
    }

    #[test]
    fn commit_keeps_prediction() {
        let mut value = 10;
        let command = Optimistic::apply(&mut value, 11);
        assert_eq!(*command.original(), 10);
        assert_eq!(command.commit(), 11);
        assert_eq!(value, 11);
    }
}
