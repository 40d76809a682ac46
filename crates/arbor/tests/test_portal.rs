//! Integration tests for portal placement, nesting and teardown.

#[cfg(test)]
mod tests {
    use arbor::{
        NodeId, TypedId, Window,
        control::Container,
        error::Error,
        geom::{Expanse, Rect},
        layout::Layout,
        portal::{AnchorSource, Placement, PortalId},
        widgets::{Dropdown, Menu, Panel, Text},
    };

    type Choice = Dropdown<String>;

    /// An 80x24 window with a ten-item dropdown on row `y`.
    fn dropdown_on_row(y: i32) -> (Window, NodeId, TypedId<Choice>) {
        let mut w = Window::new((80, 24));
        let panel = w.add(Panel::column()).unwrap();
        w.tree_mut()
            .add_child(panel, Container::new(Layout::column().height(y)))
            .unwrap();
        let items = (0..10).map(|i| format!("item {i}")).collect();
        let dd = w
            .tree_mut()
            .add_child_typed(panel, Dropdown::new(items))
            .unwrap();
        (w, panel, dd)
    }

    fn content(w: &Window, p: PortalId) -> NodeId {
        w.portals().get(p).unwrap().content
    }

    #[test]
    fn dropdown_opens_below_when_there_is_room() {
        let (mut w, _, dd) = dropdown_on_row(2);
        let p = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let portal = w.portals().get(p).unwrap();
        assert_eq!(portal.placement, Placement::Below);
        assert_eq!(portal.bounds, Rect::new(0, 3, 8, 10));
        assert_eq!(portal.depth, 0);
        assert_eq!(Choice::list_portal(&w, dd), Some(p));
    }

    #[test]
    fn dropdown_near_the_bottom_opens_above() {
        let (mut w, _, dd) = dropdown_on_row(20);
        let p = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let portal = w.portals().get(p).unwrap();
        assert_eq!(portal.anchor, Rect::new(0, 20, 80, 1));
        assert_eq!(portal.placement, Placement::Above);
        assert_eq!(portal.bounds, Rect::new(0, 10, 8, 10));

        let frame = w.paint().unwrap();
        assert!(frame.line_text(10).unwrap().starts_with(" item 0 "));
        assert!(frame.line_text(19).unwrap().starts_with(" item 9 "));
        assert!(frame.line_text(20).unwrap().starts_with("item 0 ▼"));
    }

    #[test]
    fn toggling_twice_closes_and_removes_content() {
        let (mut w, _, dd) = dropdown_on_row(2);
        let p = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let menu = content(&w, p);
        assert_eq!(Choice::toggle(&mut w, dd).unwrap(), None);
        assert!(w.portals().is_empty());
        assert!(!w.tree().contains(menu));
        assert_eq!(Choice::list_portal(&w, dd), None);
    }

    #[test]
    fn confirming_selects_and_closes() {
        let (mut w, _, dd) = dropdown_on_row(5);
        Choice::toggle(&mut w, dd).unwrap();
        Choice::confirm(&mut w, dd, 3).unwrap();
        assert!(w.portals().is_empty());
        let chosen = dd.get(w.tree()).unwrap();
        assert_eq!(chosen.selected_index(), 3);
        assert_eq!(chosen.selected().map(String::as_str), Some("item 3"));
        let frame = w.paint().unwrap();
        assert!(frame.line_text(5).unwrap().starts_with("item 3 ▼"));

        Choice::confirm(&mut w, dd, 99).unwrap();
        assert_eq!(dd.get(w.tree()).unwrap().selected_index(), 3);
    }

    #[test]
    fn content_is_clamped_at_the_right_edge() {
        let mut w = Window::new((80, 24));
        let owner = w.add(Panel::stack()).unwrap();
        let body = w.tree_mut().insert(Text::new("wide"));
        let p = w
            .open_portal(owner, body, Rect::new(70, 2, 10, 1), (20, 5), Placement::Below)
            .unwrap();
        let portal = w.portals().get(p).unwrap();
        assert_eq!(portal.placement, Placement::Below);
        assert_eq!(portal.bounds, Rect::new(60, 3, 20, 5));
        assert_eq!(w.tree().get(body).unwrap().host(), Some(owner));
    }

    #[test]
    fn nested_portals_tear_down_deepest_first() {
        let (mut w, _, dd) = dropdown_on_row(2);
        let p1 = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let m1 = content(&w, p1);
        let p2 = Menu::open_submenu(&mut w, m1, 2, Menu::new(["copy", "paste"])).unwrap();
        let m2 = content(&w, p2);
        let p3 = Menu::open_submenu(&mut w, m2, 1, Menu::new(["plain"])).unwrap();
        let m3 = content(&w, p3);

        let second = w.portals().get(p2).unwrap();
        assert_eq!(second.parent, Some(p1));
        assert_eq!(second.depth, 1);
        assert_eq!(second.placement, Placement::Right);
        // Row 2 of the first menu, which sits at (0, 3).
        assert_eq!(second.anchor, Rect::new(0, 5, 8, 1));
        assert_eq!(second.bounds.tl.x, 8);
        assert_eq!(w.portals().get(p3).unwrap().depth, 2);
        assert_eq!(w.portals().paint_order(), vec![p1, p2, p3]);
        assert_eq!(w.portals().teardown_order(p1), vec![p3, p2, p1]);

        assert_eq!(w.close_portal(p1).unwrap(), vec![p3, p2, p1]);
        assert!(w.portals().is_empty());
        for m in [m1, m2, m3] {
            assert!(!w.tree().contains(m));
        }
        // The dropdown notices its list is gone and reopens on the next toggle.
        assert!(Choice::toggle(&mut w, dd).unwrap().is_some());
    }

    #[test]
    fn closing_an_inner_portal_keeps_the_outer_one() {
        let (mut w, _, dd) = dropdown_on_row(2);
        let p1 = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let m1 = content(&w, p1);
        let p2 = Menu::open_submenu(&mut w, m1, 0, Menu::new(["a"])).unwrap();
        assert_eq!(w.close_portal(p2).unwrap(), vec![p2]);
        assert_eq!(w.portals().len(), 1);
        assert!(w.portals().get(p1).is_ok());
    }

    #[test]
    fn removing_the_owner_closes_its_portals() {
        let (mut w, panel, dd) = dropdown_on_row(2);
        let p1 = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let m1 = content(&w, p1);
        Menu::open_submenu(&mut w, m1, 0, Menu::new(["a"])).unwrap();
        assert_eq!(w.portals().len(), 2);

        let removed = w.remove(panel).unwrap();
        assert!(removed.contains(&dd.id()));
        assert!(w.portals().is_empty());
        assert!(!w.tree().contains(m1));
        w.paint().unwrap();
    }

    #[test]
    fn moving_reopens_under_a_new_id() {
        let (mut w, _, dd) = dropdown_on_row(2);
        let p1 = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let m1 = content(&w, p1);
        let p2 = Menu::open_submenu(&mut w, m1, 0, Menu::new(["a"])).unwrap();
        let m2 = content(&w, p2);

        let moved = w.move_portal(p1, Rect::new(30, 0, 10, 1)).unwrap();
        assert_ne!(moved, p1);
        assert!(matches!(w.portals().get(p1), Err(Error::PortalNotFound(_))));
        assert!(w.portals().get(p2).is_err());
        assert!(!w.tree().contains(m2));
        let portal = w.portals().get(moved).unwrap();
        assert_eq!(portal.content, m1);
        assert_eq!(portal.bounds, Rect::new(30, 1, 8, 10));
        assert_eq!(w.portals().by_content(m1), Some(moved));
    }

    #[test]
    fn lists_follow_their_dropdown_when_layout_moves_it() {
        let (mut w, panel, dd) = dropdown_on_row(2);
        let spacer = w.tree().children(panel)[0];
        let p = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let menu = content(&w, p);
        assert_eq!(w.portals().get(p).unwrap().anchor_source, AnchorSource::Owner);
        w.paint().unwrap();

        w.tree_mut()
            .update_layout(spacer, |l| *l = l.height(10))
            .unwrap();
        let frame = w.paint().unwrap();
        assert!(frame.line_text(10).unwrap().starts_with("item 0 ▼"));
        assert!(frame.line_text(11).unwrap().starts_with(" item 0 "));
        assert!(!frame.line_text(3).unwrap().contains("item"));

        assert!(matches!(w.portals().get(p), Err(Error::PortalNotFound(_))));
        let moved = Choice::list_portal(&w, dd).unwrap();
        assert_ne!(moved, p);
        let portal = w.portals().get(moved).unwrap();
        assert_eq!(portal.content, menu);
        assert_eq!(portal.anchor, Rect::new(0, 10, 80, 1));
        assert_eq!(portal.bounds, Rect::new(0, 11, 8, 10));
        assert_eq!(w.portals().len(), 1);
    }

    #[test]
    fn lists_follow_their_dropdown_across_a_resize() {
        let mut w = Window::new((80, 24));
        let panel = w.add(Panel::column()).unwrap();
        w.tree_mut()
            .add_child(panel, Container::new(Layout::column()))
            .unwrap();
        let items = (0..10).map(|i| format!("item {i}")).collect();
        let dd = w
            .tree_mut()
            .add_child_typed(panel, Dropdown::new(items))
            .unwrap();
        let p = Choice::toggle(&mut w, dd).unwrap().unwrap();
        assert_eq!(w.portals().get(p).unwrap().bounds, Rect::new(0, 13, 8, 10));

        w.resize((80, 12));
        w.layout().unwrap();
        let p = Choice::list_portal(&w, dd).unwrap();
        let portal = w.portals().get(p).unwrap();
        assert_eq!(portal.anchor, Rect::new(0, 11, 80, 1));
        assert_eq!(portal.placement, Placement::Above);
        assert_eq!(portal.bounds, Rect::new(0, 1, 8, 10));
        let frame = w.paint().unwrap();
        assert!(frame.line_text(1).unwrap().starts_with(" item 0 "));
    }

    #[test]
    fn moving_the_dropdown_closes_its_submenus() {
        let (mut w, panel, dd) = dropdown_on_row(2);
        let spacer = w.tree().children(panel)[0];
        let p1 = Choice::toggle(&mut w, dd).unwrap().unwrap();
        let m1 = content(&w, p1);
        let p2 = Menu::open_submenu(&mut w, m1, 1, Menu::new(["x"])).unwrap();
        let m2 = content(&w, p2);
        assert_eq!(
            w.portals().get(p2).unwrap().anchor_source,
            AnchorSource::OwnerRow(1)
        );

        w.tree_mut()
            .update_layout(spacer, |l| *l = l.height(4))
            .unwrap();
        w.layout().unwrap();
        assert!(!w.tree().contains(m2));
        assert_eq!(w.portals().len(), 1);
        let p = Choice::list_portal(&w, dd).unwrap();
        assert_ne!(p, p1);
        assert_eq!(w.portals().get(p).unwrap().bounds, Rect::new(0, 5, 8, 10));

        let p3 = Menu::open_submenu(&mut w, m1, 1, Menu::new(["y"])).unwrap();
        assert_eq!(w.portals().get(p3).unwrap().anchor, Rect::new(0, 6, 8, 1));
    }

    #[test]
    fn color_changes_reach_open_lists() {
        use arbor::color::{Color, ColorOverride};

        let (mut w, panel, dd) = dropdown_on_row(2);
        Choice::toggle(&mut w, dd).unwrap();
        // Row 1 of the list, which is not highlighted.
        let item = |w: &mut Window| {
            let frame = w.paint().unwrap();
            let cell = frame.get((1, 4).into()).unwrap();
            (cell.ch, cell.fg, cell.bg)
        };
        assert_eq!(item(&mut w), ('i', Color::Reset, Color::Reset));

        let green = ColorOverride {
            fg: Some(Color::Red),
            bg: Some(Color::Green),
        };
        w.tree_mut().set_colors(dd.id(), green).unwrap();
        assert_eq!(item(&mut w), ('i', Color::Red, Color::Green));
        let frame = w.paint().unwrap();
        assert_eq!(frame.get((0, 2).into()).unwrap().bg, Color::Green);

        w.tree_mut()
            .set_colors(dd.id(), ColorOverride::default())
            .unwrap();
        let blue = ColorOverride {
            fg: None,
            bg: Some(Color::Blue),
        };
        w.tree_mut().set_colors(panel, blue).unwrap();
        assert_eq!(item(&mut w), ('i', Color::Reset, Color::Blue));
    }

    #[test]
    fn invalid_portals_are_rejected() {
        let mut w = Window::new((40, 10));
        let owner = w.add(Panel::stack()).unwrap();
        let attached = w.tree_mut().add_child(owner, Text::new("x")).unwrap();
        let anchor = Rect::new(0, 0, 1, 1);
        assert!(matches!(
            w.open_portal(owner, attached, anchor, (3, 1), Placement::Below),
            Err(Error::Invalid(_))
        ));
        assert!(matches!(
            w.open_portal(owner, w.root(), anchor, (3, 1), Placement::Below),
            Err(Error::Invalid(_))
        ));

        let body = w.tree_mut().insert(Container::new(Layout::column()));
        let inner = w.tree_mut().add_child(body, Text::new("y")).unwrap();
        assert!(matches!(
            w.open_portal(inner, body, anchor, (3, 1), Placement::Below),
            Err(Error::Invalid(_))
        ));
        w.open_portal(owner, body, anchor, (3, 1), Placement::Below)
            .unwrap();
        assert!(matches!(
            w.open_portal(owner, body, anchor, (3, 1), Placement::Below),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn portals_paint_over_the_tree_with_owner_colors() {
        use arbor::color::{Color, ColorOverride};

        let mut w = Window::new((12, 4));
        let owner = w.add(Panel::stack().with_fill('.')).unwrap();
        w.tree_mut()
            .set_colors(
                owner,
                ColorOverride {
                    fg: Some(Color::Yellow),
                    bg: None,
                },
            )
            .unwrap();
        let body = w.tree_mut().insert(Text::new("TOP"));
        w.open_portal(owner, body, Rect::new(2, 0, 5, 1), (3, 1), Placement::Below)
            .unwrap();
        let frame = w.paint().unwrap();
        assert_eq!(frame.line_text(0).unwrap(), "............");
        assert_eq!(frame.line_text(1).unwrap(), "..TOP.......");
        let cell = frame.get((2, 1).into()).unwrap();
        assert_eq!(cell.fg, Color::Yellow);
    }

    #[test]
    fn resizing_reclamps_portals() {
        let mut w = Window::new((80, 24));
        let owner = w.add(Panel::stack()).unwrap();
        let body = w.tree_mut().insert(Text::new("menu"));
        let p = w
            .open_portal(owner, body, Rect::new(50, 2, 4, 1), (20, 5), Placement::Below)
            .unwrap();
        assert_eq!(w.portals().get(p).unwrap().bounds, Rect::new(50, 3, 20, 5));
        w.resize((60, 24));
        assert_eq!(w.portals().get(p).unwrap().bounds, Rect::new(40, 3, 20, 5));
        assert_eq!(Expanse::new(60, 24), w.size());
        w.paint().unwrap();
    }
}
