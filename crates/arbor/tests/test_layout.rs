//! Integration tests for measure and arrange.

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use arbor::{
        NodeId, Tree,
        control::{Container, Control, Measurable},
        error::Error,
        geom::{Axis, Constraints, Edges, Expanse, Rect},
        invalidate::InvalidationReason,
        layout::{Align, Direction, FlexItem, Layout, distribute},
    };
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    /// A leaf with a fixed intrinsic size that counts measure calls.
    struct Leaf {
        size: Expanse,
        layout: Layout,
        calls: Arc<AtomicUsize>,
    }

    impl Leaf {
        fn new(w: u32, h: u32) -> Self {
            Self {
                size: Expanse::new(w, h),
                layout: Layout::default(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_layout(mut self, layout: Layout) -> Self {
            self.layout = layout;
            self
        }
    }

    impl Control for Leaf {
        fn layout(&self) -> Layout {
            self.layout
        }

        fn as_measurable(&self) -> Option<&dyn Measurable> {
            Some(self)
        }
    }

    impl Measurable for Leaf {
        fn measure(&self, _c: Constraints) -> Expanse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.size
        }
    }

    fn boxed(layout: Layout) -> Container {
        Container::new(layout)
    }

    fn bounds(t: &Tree, id: NodeId) -> Rect {
        t.get(id).unwrap().bounds()
    }

    #[test]
    fn flex_shares_split_a_row() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row()));
        let a = t.add_child(root, boxed(Layout::default().flex(1))).unwrap();
        let b = t.add_child(root, boxed(Layout::default().flex(1))).unwrap();
        let c = t.add_child(root, boxed(Layout::default().flex(2))).unwrap();
        t.layout_root(root, Expanse::new(40, 5)).unwrap();
        assert_eq!(bounds(&t, a), Rect::new(0, 0, 10, 5));
        assert_eq!(bounds(&t, b), Rect::new(10, 0, 10, 5));
        assert_eq!(bounds(&t, c), Rect::new(20, 0, 20, 5));
    }

    #[test]
    fn clamped_child_gives_space_back() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row()));
        let a = t.add_child(root, boxed(Layout::default())).unwrap();
        let b = t
            .add_child(root, boxed(Layout::default().max_width(5)))
            .unwrap();
        let c = t.add_child(root, boxed(Layout::default())).unwrap();
        t.layout_root(root, Expanse::new(30, 1)).unwrap();
        let widths: Vec<u32> = [a, b, c].iter().map(|n| bounds(&t, *n).w).collect();
        assert_eq!(widths[1], 5);
        assert_eq!(widths.iter().sum::<u32>(), 30);
        assert!(widths[0].abs_diff(widths[2]) <= 1);
    }

    #[test]
    fn fixed_children_and_margins_are_reserved() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row()));
        let a = t
            .add_child(
                root,
                boxed(Layout::default().width(10).margin(Edges::new(0, 0, 0, 2))),
            )
            .unwrap();
        let b = t.add_child(root, boxed(Layout::default())).unwrap();
        t.layout_root(root, Expanse::new(50, 3)).unwrap();
        assert_eq!(bounds(&t, a), Rect::new(0, 0, 12, 3));
        assert_eq!(t.absolute_content(a), Some(Rect::new(2, 0, 10, 3)));
        assert_eq!(bounds(&t, b), Rect::new(12, 0, 38, 3));
    }

    #[test]
    fn container_margin_offsets_children() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::column().margin(Edges::all(1))));
        let inner = t.add_child(root, boxed(Layout::row())).unwrap();
        let leaf = t.add_child(inner, boxed(Layout::default())).unwrap();
        t.layout_root(root, Expanse::new(10, 6)).unwrap();
        assert_eq!(bounds(&t, inner), Rect::new(0, 0, 8, 4));
        assert_eq!(t.absolute_bounds(leaf), Some(Rect::new(1, 1, 8, 4)));
    }

    #[test]
    fn insufficient_space_scales_minimums() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::column()));
        let a = t
            .add_child(root, boxed(Layout::default().min_height(10)))
            .unwrap();
        let b = t
            .add_child(root, boxed(Layout::default().min_height(30)))
            .unwrap();
        t.layout_root(root, Expanse::new(5, 20)).unwrap();
        assert_eq!(bounds(&t, a).h, 5);
        assert_eq!(bounds(&t, b), Rect::new(0, 5, 5, 15));
    }

    #[test]
    fn cross_alignment() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::column()));
        let centered = t
            .add_child(
                root,
                Leaf::new(6, 2).with_layout(Layout::default().height(2).align_self(Align::Center)),
            )
            .unwrap();
        let end = t
            .add_child(
                root,
                Leaf::new(6, 2).with_layout(Layout::default().height(2).align_self(Align::End)),
            )
            .unwrap();
        let stretched = t
            .add_child(root, Leaf::new(6, 2).with_layout(Layout::default().height(2)))
            .unwrap();
        t.layout_root(root, Expanse::new(20, 10)).unwrap();
        assert_eq!(bounds(&t, centered), Rect::new(7, 0, 6, 2));
        assert_eq!(bounds(&t, end), Rect::new(14, 2, 6, 2));
        assert_eq!(bounds(&t, stretched), Rect::new(0, 4, 20, 2));
    }

    #[test]
    fn stack_places_on_both_axes() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::stack()));
        let full = t.add_child(root, boxed(Layout::default())).unwrap();
        let corner = t
            .add_child(
                root,
                Leaf::new(3, 1).with_layout(Layout::default().align_self(Align::End)),
            )
            .unwrap();
        t.layout_root(root, Expanse::new(10, 4)).unwrap();
        assert_eq!(bounds(&t, full), Rect::new(0, 0, 10, 4));
        assert_eq!(bounds(&t, corner), Rect::new(7, 3, 3, 1));
    }

    #[test]
    fn hidden_children_take_no_space() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row()));
        let a = t.add_child(root, boxed(Layout::default())).unwrap();
        let b = t.add_child(root, boxed(Layout::default())).unwrap();
        let c = t.add_child(root, boxed(Layout::default())).unwrap();
        t.set_visible(b, false).unwrap();
        t.layout_root(root, Expanse::new(30, 1)).unwrap();
        assert_eq!(bounds(&t, a), Rect::new(0, 0, 15, 1));
        assert_eq!(bounds(&t, b), Rect::zero());
        assert_eq!(bounds(&t, c), Rect::new(15, 0, 15, 1));
    }

    #[test]
    fn negative_sizes_become_zero() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row()));
        let a = t
            .add_child(root, boxed(Layout::default().width(-5)))
            .unwrap();
        let b = t.add_child(root, boxed(Layout::default())).unwrap();
        t.layout_root(root, Expanse::new(20, 2)).unwrap();
        assert_eq!(bounds(&t, a).w, 0);
        assert_eq!(bounds(&t, b), Rect::new(0, 0, 20, 2));
    }

    #[test]
    fn arrange_requires_measure() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::column()));
        let err = t.arrange(root, Rect::new(0, 0, 5, 5)).unwrap_err();
        assert_eq!(err, Error::ArrangeWithoutMeasure(root));
        assert!(err.is_protocol());

        t.measure(root, Constraints::tight(Expanse::new(5, 5))).unwrap();
        assert!(t.arrange(root, Rect::new(0, 0, 6, 5)).is_err());
        t.arrange(root, Rect::new(0, 0, 5, 5)).unwrap();

        t.invalidate(root, InvalidationReason::SizeChanged);
        assert_eq!(
            t.arrange(root, Rect::new(0, 0, 5, 5)),
            Err(Error::ArrangeWithoutMeasure(root))
        );

        // Loose constraints admit 5x5, but the node asked for 0x0.
        t.measure(root, Constraints::loose(Expanse::new(10, 10))).unwrap();
        assert_eq!(t.get(root).unwrap().desired(), Expanse::ZERO);
        assert_eq!(
            t.arrange(root, Rect::new(0, 0, 5, 5)),
            Err(Error::ArrangeWithoutMeasure(root))
        );
        t.arrange(root, Rect::zero()).unwrap();
    }

    #[test]
    fn stretch_is_settled_before_arrange() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::stack().align(Align::Start)));
        let col = t.add_child(root, boxed(Layout::column())).unwrap();
        let wide = t
            .add_child(col, Leaf::new(20, 1).with_layout(Layout::default().height(1)))
            .unwrap();
        let narrow = Leaf::new(5, 1).with_layout(Layout::default().height(1));
        let calls = Arc::clone(&narrow.calls);
        let narrow = t.add_child(col, narrow).unwrap();

        t.measure(root, Constraints::tight(Expanse::new(40, 10))).unwrap();
        let measured = calls.load(Ordering::SeqCst);
        assert_eq!(t.get(narrow).unwrap().desired(), Expanse::new(20, 1));

        t.arrange(root, Rect::new(0, 0, 40, 10)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), measured);
        assert_eq!(bounds(&t, col), Rect::new(0, 0, 20, 2));
        assert_eq!(bounds(&t, wide), Rect::new(0, 0, 20, 1));
        assert_eq!(bounds(&t, narrow), Rect::new(0, 1, 20, 1));
    }

    #[test]
    fn stretched_stack_children_fill_the_stack() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row().align(Align::Start)));
        let stack = t.add_child(root, boxed(Layout::stack())).unwrap();
        let big = t.add_child(stack, Leaf::new(6, 3)).unwrap();
        let capped = t
            .add_child(stack, Leaf::new(1, 1).with_layout(Layout::default().max_width(4)))
            .unwrap();
        t.layout_root(root, Expanse::new(30, 8)).unwrap();
        assert_eq!(bounds(&t, stack), Rect::new(0, 0, 30, 3));
        assert_eq!(bounds(&t, big), Rect::new(0, 0, 30, 3));
        assert_eq!(bounds(&t, capped), Rect::new(0, 0, 4, 3));
    }

    #[test]
    fn explicit_size_holds_with_smaller_children() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::stack().align(Align::Start)));
        let col = t
            .add_child(root, boxed(Layout::column().width(12)))
            .unwrap();
        t.add_child(
            col,
            Leaf::new(3, 1).with_layout(Layout::default().height(1).align_self(Align::Start)),
        )
        .unwrap();
        t.layout_root(root, Expanse::new(40, 10)).unwrap();
        assert_eq!(bounds(&t, col).w, 12);
    }

    #[test]
    fn measure_is_memoized_until_invalidated() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::column()));
        let leaf = Leaf::new(3, 3);
        let calls = Arc::clone(&leaf.calls);
        let id = t.add_child(root, leaf).unwrap();
        let size = Expanse::new(20, 10);

        t.layout_root(root, size).unwrap();
        t.layout_root(root, size).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        t.invalidate(id, InvalidationReason::StateChanged);
        t.layout_root(root, size).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        t.invalidate(id, InvalidationReason::ContentChanged);
        t.layout_root(root, size).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        t.layout_root(root, Expanse::new(21, 10)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn moved_children_are_laid_out_again() {
        let mut t = Tree::new();
        let root = t.insert(boxed(Layout::row()));
        let left = t.add_child(root, boxed(Layout::column())).unwrap();
        let right = t.add_child(root, boxed(Layout::column())).unwrap();
        let leaf = t.add_child(left, boxed(Layout::default())).unwrap();
        t.layout_root(root, Expanse::new(20, 4)).unwrap();
        assert_eq!(t.absolute_bounds(leaf), Some(Rect::new(0, 0, 10, 4)));

        t.attach(right, leaf).unwrap();
        t.layout_root(root, Expanse::new(20, 4)).unwrap();
        assert_eq!(t.absolute_bounds(leaf), Some(Rect::new(10, 0, 10, 4)));
    }

    /// Build a random tree below `parent`.
    fn grow(t: &mut Tree, rng: &mut StdRng, parent: NodeId, depth: usize) {
        let n = rng.random_range(0..4);
        for _ in 0..n {
            let direction = match rng.random_range(0..3) {
                0 => Direction::Row,
                1 => Direction::Column,
                _ => Direction::Stack,
            };
            let mut layout = Layout::default()
                .direction(direction)
                .flex(rng.random_range(0..4))
                .margin(Edges::new(
                    rng.random_range(0..2),
                    rng.random_range(0..2),
                    rng.random_range(0..2),
                    rng.random_range(0..2),
                ));
            if rng.random_bool(0.3) {
                layout = layout.width(rng.random_range(-3..30));
            }
            if rng.random_bool(0.3) {
                layout = layout.height(rng.random_range(-3..12));
            }
            if rng.random_bool(0.2) {
                layout = layout.min_width(rng.random_range(0..20));
            }
            if rng.random_bool(0.2) {
                layout = layout.max_height(rng.random_range(0..8));
            }
            layout.align = match rng.random_range(0..4) {
                0 => Align::Start,
                1 => Align::Center,
                2 => Align::End,
                _ => Align::Stretch,
            };
            let id = if depth == 0 || rng.random_bool(0.3) {
                t.add_child(
                    parent,
                    Leaf::new(rng.random_range(0..15), rng.random_range(0..5)).with_layout(layout),
                )
                .unwrap()
            } else {
                t.add_child(parent, boxed(layout)).unwrap()
            };
            if rng.random_bool(0.1) {
                t.set_visible(id, false).unwrap();
            }
            if depth > 0 {
                grow(t, rng, id, depth - 1);
            }
        }
    }

    /// Nodes reachable from `root` through visible nodes only.
    fn shown(t: &Tree, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = t.get(id).unwrap();
            if node.is_visible() {
                out.push(id);
                stack.extend(node.children().iter().copied());
            }
        }
        out
    }

    #[test]
    fn random_trees_lay_out_consistently() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut t = Tree::new();
            let root = t.insert(boxed(Layout::row()));
            grow(&mut t, &mut rng, root, 3);
            let size = Expanse::new(60, 20);
            t.layout_root(root, size).unwrap();
            assert_eq!(bounds(&t, root), Rect::new(0, 0, 60, 20));

            for id in shown(&t, root) {
                let node = t.get(id).unwrap();
                assert!(!node.needs_layout(), "seed {seed}: unmeasured node");
                let Some(axis) = node.layout().direction.axis() else {
                    continue;
                };
                let mut edge = 0;
                for c in node.children() {
                    let child = t.get(*c).unwrap();
                    if !child.is_visible() {
                        continue;
                    }
                    let r = child.bounds();
                    assert_eq!(r.origin_along(axis), edge, "seed {seed}: gap or overlap");
                    edge += r.expanse().along(axis);
                }
            }
            // A second pass over an unchanged tree is stable.
            let before: Vec<Rect> = t.descendants(root).iter().map(|n| bounds(&t, *n)).collect();
            t.layout_root(root, size).unwrap();
            let after: Vec<Rect> = t.descendants(root).iter().map(|n| bounds(&t, *n)).collect();
            assert_eq!(before, after, "seed {seed}");
        }
    }

    fn constraints() -> impl Strategy<Value = Constraints> {
        (
            0u32..40,
            proptest::option::of(0u32..40),
            0u32..40,
            proptest::option::of(0u32..40),
        )
            .prop_map(|(min_w, extra_w, min_h, extra_h)| {
                Constraints::new(min_w, extra_w.map(|e| min_w + e), min_h, extra_h.map(|e| min_h + e))
            })
    }

    proptest! {
        #[test]
        fn measure_always_satisfies_constraints(
            c in constraints(),
            w in 0u32..200,
            h in 0u32..200,
            margin in 0u32..6,
            explicit in proptest::option::of(-5i32..100),
            max_h in proptest::option::of(0i32..50),
        ) {
            let mut t = Tree::new();
            let mut layout = Layout::default().margin(Edges::all(margin));
            if let Some(e) = explicit {
                layout = layout.width(e);
            }
            if let Some(m) = max_h {
                layout = layout.max_height(m);
            }
            let id = t.insert(Leaf::new(w, h).with_layout(layout));
            let size = t.measure(id, c).unwrap();
            prop_assert!(c.contains(size));
        }

        #[test]
        fn containers_satisfy_constraints(
            c in constraints(),
            dir in 0u8..3,
            kids in proptest::collection::vec((0u32..30, 0u32..30, 0u32..3), 0..6),
        ) {
            let direction = match dir {
                0 => Direction::Row,
                1 => Direction::Column,
                _ => Direction::Stack,
            };
            let mut t = Tree::new();
            let root = t.insert(boxed(Layout::default().direction(direction)));
            for (w, h, flex) in kids {
                t.add_child(root, Leaf::new(w, h).with_layout(Layout::default().flex(flex)))
                    .unwrap();
            }
            let size = t.measure(root, c).unwrap();
            prop_assert!(c.contains(size));
            t.arrange(root, Rect::new(0, 0, size.w, size.h)).unwrap();
        }

        #[test]
        fn flex_allocations_respect_bounds(
            budget in 1u32..500,
            items in proptest::collection::vec((0u32..5, 0u32..40, proptest::option::of(0u32..60)), 1..8),
        ) {
            let items: Vec<FlexItem> = items
                .into_iter()
                .map(|(f, min, max)| FlexItem::new(f, min, max))
                .collect();
            let out = distribute(budget, &items);
            prop_assert_eq!(out.len(), items.len());
            prop_assert!(out.iter().sum::<u32>() <= budget);
            let mins: u32 = items.iter().map(|i| i.min).sum();
            if mins <= budget {
                for (a, i) in out.iter().zip(&items) {
                    prop_assert!(*a >= i.min);
                    prop_assert!(i.max.is_none_or(|m| *a <= m));
                }
                let open = items.iter().all(|i| i.max.is_none()) && items.iter().any(|i| i.factor > 0);
                if open {
                    prop_assert_eq!(out.iter().sum::<u32>(), budget);
                }
            }
        }
    }

    #[test]
    fn axis_helpers_agree() {
        let r = Rect::new(3, 4, 5, 6);
        assert_eq!(r.origin_along(Axis::Horizontal), 3);
        assert_eq!(r.expanse().along(Axis::Vertical), 6);
    }
}
