//! 侵入式二叉最小堆
//! Intrusive binary min-heap
//!
//! 堆按截止时间排序，相同截止时间按创建序号升序。每个条目记录自己在堆中的
//! 索引，因此可以在 O(log n) 时间内删除任意条目（不仅仅是根）。
//!
//! The heap is ordered by deadline, ties broken by ascending creation sequence.
//! Every entry tracks its own index, so an arbitrary entry (not only the root)
//! is removed in O(log n).
//!
//! | 操作 Operation | 复杂度 Cost |
//! |---|---|
//! | `insert` | O(log n) |
//! | `remove` | O(log n) |
//! | `peek` | O(1) |
//! | `pop` | O(log n) |

use crate::timer::entry::TimerEntry;

/// 可以驻留在堆中的节点
/// A node that can reside in the heap
pub trait HeapMember {
    /// 节点嵌入的条目
    /// The entry embedded in the node
    fn entry(&self) -> &TimerEntry;
}

/// 定时器最小堆
/// Timer min-heap
#[derive(Debug)]
pub struct TimerHeap<N: HeapMember> {
    nodes: Vec<N>,
}

impl<N: HeapMember> Default for TimerHeap<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: HeapMember> TimerHeap<N> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 最早到期的节点
    /// The earliest node
    pub fn peek(&self) -> Option<&N> {
        self.nodes.first()
    }

    /// 以堆顺序（非排序顺序）遍历节点
    /// Iterate nodes in heap layout order (not sorted)
    pub fn iter(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    /// 插入节点
    /// Insert a node
    ///
    /// # Panics
    /// 调试构建中，如果条目已在堆中则 panic
    /// Panics in debug builds if the entry is already heap-resident
    pub fn insert(&mut self, node: N) {
        debug_assert!(
            !node.entry().is_heap_resident(),
            "entry is already heap-resident"
        );
        let index = self.nodes.len();
        node.entry().set_heap_index(Some(index));
        self.nodes.push(node);
        self.sift_up(index);
    }

    /// 弹出最早到期的节点并清除其堆链接
    /// Pop the earliest node and clear its heap link
    pub fn pop(&mut self) -> Option<N> {
        if self.nodes.is_empty() {
            return None;
        }
        let node = self.nodes.swap_remove(0);
        node.entry().set_heap_index(None);
        if let Some(first) = self.nodes.first() {
            first.entry().set_heap_index(Some(0));
            self.sift_down(0);
        }
        Some(node)
    }

    /// 删除任意条目并清除其堆链接，确保过期索引不会被重用
    /// Remove an arbitrary entry and clear its heap link so a stale index is
    /// never reused
    ///
    /// # Returns
    /// 条目不在此堆中时返回 `None`
    /// Returns `None` if the entry is not in this heap
    pub fn remove(&mut self, entry: &TimerEntry) -> Option<N> {
        let index = entry.heap_index()?;
        let owned_here = self
            .nodes
            .get(index)
            .is_some_and(|node| std::ptr::eq(node.entry(), entry));
        if !owned_here {
            return None;
        }

        let node = self.nodes.swap_remove(index);
        node.entry().set_heap_index(None);
        if let Some(moved) = self.nodes.get(index) {
            // 被移到空位的尾节点可能需要上浮或下沉
            // The tail node moved into the hole may need to go either way
            moved.entry().set_heap_index(Some(index));
            let index = self.sift_up(index);
            self.sift_down(index);
        }
        Some(node)
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.nodes[index].entry().precedes(self.nodes[parent].entry()) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.nodes.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && self.nodes[left].entry().precedes(self.nodes[smallest].entry()) {
                smallest = left;
            }
            if right < len && self.nodes[right].entry().precedes(self.nodes[smallest].entry()) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.nodes.swap(a, b);
        self.nodes[a].entry().set_heap_index(Some(a));
        self.nodes[b].entry().set_heap_index(Some(b));
    }
}
