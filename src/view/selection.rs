use indexmap::IndexSet;

use crate::event::{ListenerId, Listeners};

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDir {
    Up,
    Down,
}

/// Half-open row range `[top, bottom)` the cursor is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub top: usize,
    pub bottom: usize,
}

/// Cursor moves and membership changes are distinct variants; consumers that
/// auto-scroll react only to `CursorMoved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    CursorMoved { old: usize, new: usize },
    Toggled { line: usize },
}

/// The active-line cursor plus the set of selected rows.
///
/// Selected rows keep toggle order, so ids handed to the task binary appear
/// in the order the user picked them.
pub struct Selection {
    active_line: usize,
    selected: IndexSet<usize>,
    range: Option<RowRange>,
    listeners: Listeners<SelectionEvent>,
}

impl Selection {
    pub fn new(active_line: usize, range: Option<RowRange>) -> Self {
        Selection {
            active_line,
            selected: IndexSet::new(),
            range,
            listeners: Listeners::new(),
        }
    }

    pub fn register_listener(
        &mut self,
        listener: impl FnMut(&SelectionEvent) + 'static,
    ) -> ListenerId {
        self.listeners.register(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    /// Move the cursor by `cells`. Returns `false` and leaves everything
    /// unchanged when the candidate falls outside the constraint range.
    pub fn move_cursor(&mut self, dir: CursorDir, cells: usize) -> bool {
        let candidate = match dir {
            CursorDir::Down => self.active_line.checked_add(cells),
            CursorDir::Up => self.active_line.checked_sub(cells),
        };
        let Some(new) = candidate else { return false };
        if !self.admits(new) {
            return false;
        }
        let old = self.active_line;
        self.active_line = new;
        self.listeners
            .notify(&SelectionEvent::CursorMoved { old, new });
        true
    }

    fn admits(&self, line: usize) -> bool {
        match self.range {
            Some(r) => line >= r.top && line < r.bottom,
            None => true,
        }
    }

    /// Add the active line to the selection set, or remove it when present.
    pub fn toggle_active_line_selected(&mut self) {
        let line = self.active_line;
        if !self.selected.shift_remove(&line) {
            self.selected.insert(line);
        }
        self.listeners.notify(&SelectionEvent::Toggled { line });
    }

    /// Empty the selection set without touching the cursor. Emits nothing:
    /// clearing only happens on reload, which rebuilds the layout wholesale.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Pull the cursor inside `[top, bottom]` without emitting an event.
    /// Used when the region scrolls out from under the cursor.
    pub(crate) fn clamp_to(&mut self, top: usize, bottom: usize) {
        if self.active_line < top {
            self.active_line = top;
        } else if self.active_line > bottom {
            self.active_line = bottom;
        }
    }

    pub fn active_line(&self) -> usize {
        self.active_line
    }

    pub fn is_selected(&self, line: usize) -> bool {
        self.selected.contains(&line)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Selected rows in toggle order.
    pub fn selected_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn constrained() -> Selection {
        Selection::new(0, Some(RowRange { top: 0, bottom: 5 }))
    }

    #[test]
    fn cursor_stays_inside_the_half_open_range() {
        let mut sel = constrained();

        assert!(!sel.move_cursor(CursorDir::Up, 1));
        assert_eq!(sel.active_line(), 0);

        for _ in 0..4 {
            assert!(sel.move_cursor(CursorDir::Down, 1));
        }
        assert_eq!(sel.active_line(), 4);

        // bottom is exclusive
        assert!(!sel.move_cursor(CursorDir::Down, 1));
        assert_eq!(sel.active_line(), 4);
    }

    #[test]
    fn rejected_moves_emit_nothing() {
        let mut sel = constrained();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        sel.register_listener(move |e| sink.borrow_mut().push(*e));

        assert!(!sel.move_cursor(CursorDir::Up, 1));
        assert!(events.borrow().is_empty());

        assert!(sel.move_cursor(CursorDir::Down, 2));
        assert_eq!(
            *events.borrow(),
            vec![SelectionEvent::CursorMoved { old: 0, new: 2 }]
        );
    }

    #[test]
    fn unconstrained_cursor_moves_freely() {
        let mut sel = Selection::new(10, None);
        assert!(sel.move_cursor(CursorDir::Down, 100));
        assert_eq!(sel.active_line(), 110);
        assert!(sel.move_cursor(CursorDir::Up, 110));
        assert_eq!(sel.active_line(), 0);
        // but never below row zero
        assert!(!sel.move_cursor(CursorDir::Up, 1));
    }

    #[test]
    fn toggle_is_involutive() {
        let mut sel = constrained();
        sel.move_cursor(CursorDir::Down, 2);

        sel.toggle_active_line_selected();
        assert!(sel.is_selected(2));
        sel.toggle_active_line_selected();
        assert!(!sel.is_selected(2));
        assert!(!sel.has_selection());
    }

    #[test]
    fn toggle_emits_a_membership_event_not_a_move() {
        let mut sel = constrained();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        sel.register_listener(move |e| sink.borrow_mut().push(*e));

        sel.toggle_active_line_selected();
        assert_eq!(*events.borrow(), vec![SelectionEvent::Toggled { line: 0 }]);
    }

    #[test]
    fn selected_lines_keep_toggle_order() {
        let mut sel = Selection::new(0, None);
        for line in [4, 1, 3] {
            while sel.active_line() < line {
                sel.move_cursor(CursorDir::Down, 1);
            }
            while sel.active_line() > line {
                sel.move_cursor(CursorDir::Up, 1);
            }
            sel.toggle_active_line_selected();
        }
        assert_eq!(sel.selected_lines().collect::<Vec<_>>(), vec![4, 1, 3]);
    }

    #[test]
    fn clear_empties_the_set_and_keeps_the_cursor() {
        let mut sel = constrained();
        sel.move_cursor(CursorDir::Down, 3);
        sel.toggle_active_line_selected();
        sel.clear();
        assert!(!sel.has_selection());
        assert_eq!(sel.active_line(), 3);
    }
}
