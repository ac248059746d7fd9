//! Random draw order over eligible candidates.

use rand::seq::SliceRandom;
use rand::Rng;

/// Candidates in a fixed random order, handed out once each.
///
/// The permutation is decided up front; iteration only advances a cursor,
/// so a drained `DrawOrder` stays drained.
#[derive(Debug, Clone)]
pub struct DrawOrder<T> {
    order: Vec<T>,
    cursor: usize,
}

impl<T> DrawOrder<T> {
    /// Candidates not yet drawn.
    pub fn remaining(&self) -> &[T] {
        &self.order[self.cursor..]
    }
}

impl<T: Clone> Iterator for DrawOrder<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.order.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.order.len() - self.cursor;
        (n, Some(n))
    }
}

impl<T: Clone> ExactSizeIterator for DrawOrder<T> {}

/// Uniformly shuffled draw order using the thread-local RNG.
pub fn draw_order<T>(candidates: Vec<T>) -> DrawOrder<T> {
    draw_order_with(candidates, &mut rand::rng())
}

/// Same as [`draw_order`] with a caller-supplied RNG.
pub fn draw_order_with<T, R: Rng + ?Sized>(mut candidates: Vec<T>, rng: &mut R) -> DrawOrder<T> {
    candidates.shuffle(rng);
    DrawOrder {
        order: candidates,
        cursor: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        let mut d = draw_order(Vec::<String>::new());
        assert_eq!(d.len(), 0);
        assert!(d.next().is_none());
    }

    #[test]
    fn exhausted_order_stays_exhausted() {
        let mut d = draw_order(vec!["a", "b"]);
        assert_eq!(d.by_ref().count(), 2);
        assert!(d.next().is_none());
        assert!(d.remaining().is_empty());
    }
}
