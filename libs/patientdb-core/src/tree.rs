//! A bag-per-key AVL tree: every node holds a `Vec<V>` of all values
//! inserted under an equal key, rather than rejecting duplicates. This is
//! the order-statistic structure `byCountryDate`/`byVirusDate` use to keep
//! patients grouped by entry date while supporting range scans.
//!
//! Grounded directly on `original_source/tree.c`'s single/double rotation
//! AVL with a `List` bag at each node; `std::ops::ControlFlow` replaces the
//! C callback convention of "return nonzero to abort and propagate".

use std::cmp::Ordering;
use std::ops::ControlFlow;

struct Node<K, V> {
    key: K,
    bag: Vec<V>,
    height: i32,
    left: Option<Box<Node<K, V>>>,
    right: Option<Box<Node<K, V>>>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            bag: vec![value],
            height: 0,
            left: None,
            right: None,
        })
    }
}

fn height<K, V>(node: &Option<Box<Node<K, V>>>) -> i32 {
    node.as_ref().map_or(-1, |n| n.height)
}

fn update_height<K, V>(node: &mut Node<K, V>) {
    node.height = 1 + height(&node.left).max(height(&node.right));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Pre,
    In,
    Post,
}

/// An order-statistic tree mapping keys to bags of values, ordered by `K`.
pub struct Tree<K, V> {
    root: Option<Box<Node<K, V>>>,
    size: usize,
}

impl<K: Ord, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> Tree<K, V> {
    pub fn new() -> Self {
        Tree { root: None, size: 0 }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.root = Some(insert_recurs(self.root.take(), key, value));
        self.size += 1;
    }

    /// All values whose key compares equal to `key`, in insertion order.
    pub fn locate(&self, key: &K) -> Option<&[V]> {
        locate_recurs(self.root.as_deref(), key)
    }

    /// Visit every bag in the tree in the given order, stopping early (and
    /// returning the break value) the first time `cb` returns `Break`.
    pub fn traverse<B>(
        &self,
        order: Order,
        mut cb: impl FnMut(&K, &[V]) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        traverse_recurs(self.root.as_deref(), order, &mut cb)
    }

    /// Visit every bag whose key falls within `[min, max]` (inclusive), in
    /// the given order, pruning subtrees that cannot contain an in-range
    /// key.
    pub fn traverse_range<B>(
        &self,
        order: Order,
        min: &K,
        max: &K,
        mut cb: impl FnMut(&K, &[V]) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        traverse_range_recurs(self.root.as_deref(), order, min, max, &mut cb)
    }
}

fn insert_recurs<K: Ord, V>(node: Option<Box<Node<K, V>>>, key: K, value: V) -> Box<Node<K, V>> {
    let mut node = match node {
        None => return Node::new(key, value),
        Some(n) => n,
    };

    match key.cmp(&node.key) {
        Ordering::Less => node.left = Some(insert_recurs(node.left.take(), key, value)),
        Ordering::Greater => node.right = Some(insert_recurs(node.right.take(), key, value)),
        Ordering::Equal => {
            node.bag.push(value);
            return node;
        }
    }

    update_height(&mut node);
    rebalance(node)
}

fn rebalance<K: Ord, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let balance = height(&node.left) - height(&node.right);

    if balance > 1 {
        let left = node.left.as_ref().expect("balance > 1 implies a left child");
        if height(&left.left) >= height(&left.right) {
            node = rotate_right(node);
        } else {
            node.left = Some(rotate_left(node.left.take().unwrap()));
            node = rotate_right(node);
        }
    } else if balance < -1 {
        let right = node.right.as_ref().expect("balance < -1 implies a right child");
        if height(&right.right) >= height(&right.left) {
            node = rotate_left(node);
        } else {
            node.right = Some(rotate_right(node.right.take().unwrap()));
            node = rotate_left(node);
        }
    }

    node
}

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let mut lnode = node.left.take().expect("rotate_right requires a left child");
    node.left = lnode.right.take();
    update_height(&mut node);
    lnode.right = Some(node);
    update_height(&mut lnode);
    lnode
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let mut rnode = node.right.take().expect("rotate_left requires a right child");
    node.right = rnode.left.take();
    update_height(&mut node);
    rnode.left = Some(node);
    update_height(&mut rnode);
    rnode
}

fn locate_recurs<'a, K: Ord, V>(node: Option<&'a Node<K, V>>, key: &K) -> Option<&'a [V]> {
    let node = node?;
    match key.cmp(&node.key) {
        Ordering::Less => locate_recurs(node.left.as_deref(), key),
        Ordering::Greater => locate_recurs(node.right.as_deref(), key),
        Ordering::Equal => Some(&node.bag),
    }
}

fn traverse_recurs<K, V, B>(
    node: Option<&Node<K, V>>,
    order: Order,
    cb: &mut impl FnMut(&K, &[V]) -> ControlFlow<B>,
) -> ControlFlow<B> {
    let Some(node) = node else {
        return ControlFlow::Continue(());
    };

    match order {
        Order::Pre => {
            cb(&node.key, &node.bag)?;
            traverse_recurs(node.left.as_deref(), order, cb)?;
            traverse_recurs(node.right.as_deref(), order, cb)
        }
        Order::In => {
            traverse_recurs(node.left.as_deref(), order, cb)?;
            cb(&node.key, &node.bag)?;
            traverse_recurs(node.right.as_deref(), order, cb)
        }
        Order::Post => {
            traverse_recurs(node.left.as_deref(), order, cb)?;
            traverse_recurs(node.right.as_deref(), order, cb)?;
            cb(&node.key, &node.bag)
        }
    }
}

fn traverse_range_recurs<K: Ord, V, B>(
    node: Option<&Node<K, V>>,
    order: Order,
    min: &K,
    max: &K,
    cb: &mut impl FnMut(&K, &[V]) -> ControlFlow<B>,
) -> ControlFlow<B> {
    let Some(node) = node else {
        return ControlFlow::Continue(());
    };

    let in_range = &node.key >= min && &node.key <= max;
    let visit_left = &node.key > min;
    let visit_right = &node.key < max;

    macro_rules! left {
        () => {
            if visit_left {
                traverse_range_recurs(node.left.as_deref(), order, min, max, cb)?;
            }
        };
    }
    macro_rules! right {
        () => {
            if visit_right {
                traverse_range_recurs(node.right.as_deref(), order, min, max, cb)?;
            }
        };
    }
    macro_rules! here {
        () => {
            if in_range {
                cb(&node.key, &node.bag)?;
            }
        };
    }

    match order {
        Order::Pre => {
            here!();
            left!();
            right!();
        }
        Order::In => {
            left!();
            here!();
            right!();
        }
        Order::Post => {
            left!();
            right!();
            here!();
        }
    }

    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_inorder(tree: &Tree<i32, &'static str>) -> Vec<(i32, Vec<&'static str>)> {
        let mut out = Vec::new();
        tree.traverse(Order::In, |k, bag| {
            out.push((*k, bag.to_vec()));
            ControlFlow::<()>::Continue(())
        });
        out
    }

    #[test]
    fn inserts_keep_inorder_traversal_sorted() {
        let mut t = Tree::new();
        for k in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
            t.insert(k, "x");
        }
        let keys: Vec<i32> = collect_inorder(&t).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn equal_keys_accumulate_in_a_bag() {
        let mut t = Tree::new();
        t.insert(1, "a");
        t.insert(1, "b");
        t.insert(1, "c");
        assert_eq!(t.locate(&1), Some(&["a", "b", "c"][..]));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn locate_missing_key_returns_none() {
        let mut t: Tree<i32, &str> = Tree::new();
        t.insert(10, "x");
        assert_eq!(t.locate(&99), None);
    }

    #[test]
    fn traverse_range_visits_only_bounded_keys() {
        let mut t = Tree::new();
        for k in 0..20 {
            t.insert(k, k);
        }
        let mut seen = Vec::new();
        t.traverse_range(Order::In, &5, &10, |k, _| {
            seen.push(*k);
            ControlFlow::<()>::Continue(())
        });
        assert_eq!(seen, (5..=10).collect::<Vec<_>>());
    }

    #[test]
    fn traversal_stops_early_and_propagates_break_value() {
        let mut t = Tree::new();
        for k in 0..100 {
            t.insert(k, k);
        }
        let mut visited = 0;
        let result = t.traverse(Order::In, |k, _| {
            visited += 1;
            if *k == 3 {
                ControlFlow::Break(42)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(result, ControlFlow::Break(42));
        assert_eq!(visited, 4);
    }

    #[test]
    fn tree_stays_balanced_under_sorted_insertion() {
        let mut t = Tree::new();
        for k in 0..1000 {
            t.insert(k, ());
        }
        let h = t.root.as_ref().map_or(-1, |n| n.height);
        assert!((h as f64) < 2.0 * ((t.len() as f64).log2()) + 2.0);
    }

    fn assert_every_node_balanced<K: Ord, V>(node: &Option<Box<Node<K, V>>>) {
        let Some(node) = node else { return };
        let balance = height(&node.left) - height(&node.right);
        assert!(
            balance.abs() <= 1,
            "node is unbalanced: |h(left)-h(right)| = {balance}"
        );
        assert_every_node_balanced(&node.left);
        assert_every_node_balanced(&node.right);
    }

    #[test]
    fn lr_zigzag_insertion_stays_balanced() {
        // 3, then 1, then 2: 2 lands as 1's right child, forcing the
        // left-right double rotation branch of `rebalance`.
        let mut t = Tree::new();
        for k in [3, 1, 2] {
            t.insert(k, ());
            assert_every_node_balanced(&t.root);
        }
        let keys: Vec<i32> = collect_inorder(&t).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn rl_zigzag_insertion_stays_balanced() {
        // 1, then 3, then 2: 2 lands as 3's left child, forcing the
        // right-left double rotation branch of `rebalance`.
        let mut t = Tree::new();
        for k in [1, 3, 2] {
            t.insert(k, ());
            assert_every_node_balanced(&t.root);
        }
        let keys: Vec<i32> = collect_inorder(&t).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn every_node_stays_balanced_under_random_order_insertion() {
        let mut t = Tree::new();
        // A fixed pseudo-shuffled permutation (no `rand` dependency, no
        // `Math.random` in this workspace's own code either) that is not
        // monotonic in either direction, exercising both rotation kinds
        // repeatedly.
        let keys = [
            50, 17, 76, 3, 29, 61, 88, 9, 22, 41, 58, 70, 95, 1, 13, 25, 35, 45, 55, 65, 80, 90,
            99, 2, 100, 48, 52, 67, 33, 20,
        ];
        for k in keys {
            t.insert(k, ());
            assert_every_node_balanced(&t.root);
        }
    }
}
