use crate::event::{ListenerId, Listeners};

/// Fixed width/height of a region, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

/// Top-left offset of a region into the virtual buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub left: usize,
    pub top: usize,
}

/// Scrollable bounds for one axis, supplied at construction.
///
/// `start` is the smallest allowed offset. `end` is the outer edge of the
/// scrollable extent; `None` pins it to the region's own extent on that axis,
/// which yields a zero scroll range. The effective maximum offset is
/// `end − width` (or `end − height` vertically).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub start: usize,
    pub end: Option<usize>,
}

impl Constraint {
    pub fn to(start: usize, end: usize) -> Self {
        Constraint {
            start,
            end: Some(end),
        }
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint {
            start: 0,
            end: None,
        }
    }
}

/// A scroll request. Rejected requests leave the region untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left(usize),
    Right(usize),
    Up(usize),
    Down(usize),
    /// Jump to the constrained minimum top.
    Top,
    /// Jump to the constrained maximum top.
    Bottom,
    /// Jump to the constrained minimum left.
    Begin,
    /// Jump to the constrained maximum left.
    End,
    /// Make the given absolute row the region's top edge.
    SetTop(usize),
    /// Make the given absolute row the region's bottom edge.
    SetBottom(usize),
}

/// Emitted after an accepted move, with the old and new offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEvent {
    HorizontalMove { old: usize, new: usize },
    VerticalMove { old: usize, new: usize },
}

/// A clipping window over the virtual buffer with independent horizontal and
/// vertical movement constraints.
///
/// The position invariant `min ≤ offset ≤ max` holds on both axes at all
/// times; a move that would break it returns `false` and changes nothing.
/// That boolean is the only error channel here.
pub struct Region {
    size: Size,
    position: Position,
    left_min: usize,
    left_max: usize,
    top_min: usize,
    top_max: usize,
    listeners: Listeners<RegionEvent>,
}

impl Region {
    pub fn new(
        size: Size,
        position: Position,
        horizontal: Constraint,
        vertical: Constraint,
    ) -> Self {
        let left_min = horizontal.start;
        let left_max = horizontal
            .end
            .unwrap_or(size.width)
            .saturating_sub(size.width);
        let top_min = vertical.start;
        let top_max = vertical
            .end
            .unwrap_or(size.height)
            .saturating_sub(size.height);

        Region {
            size,
            position,
            left_min,
            left_max,
            top_min,
            top_max,
            listeners: Listeners::new(),
        }
    }

    pub fn register_listener(
        &mut self,
        listener: impl FnMut(&RegionEvent) + 'static,
    ) -> ListenerId {
        self.listeners.register(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    /// Apply a scroll request. Returns `true` and emits a move event when the
    /// candidate offset lies within the constraints, `false` otherwise.
    pub fn scroll(&mut self, request: Move) -> bool {
        match request {
            Move::Left(cells) => self.set_left(self.position.left.checked_sub(cells)),
            Move::Right(cells) => self.set_left(self.position.left.checked_add(cells)),
            Move::Up(cells) => self.set_top(self.position.top.checked_sub(cells)),
            Move::Down(cells) => self.set_top(self.position.top.checked_add(cells)),
            Move::Top => self.set_top(Some(self.top_min)),
            Move::Bottom => self.set_top(Some(self.top_max)),
            Move::Begin => self.set_left(Some(self.left_min)),
            Move::End => self.set_left(Some(self.left_max)),
            Move::SetTop(row) => self.set_top(Some(row)),
            // top such that `row` lands on the last visible line
            Move::SetBottom(row) => {
                self.set_top(row.checked_add(1).and_then(|r| r.checked_sub(self.size.height)))
            }
        }
    }

    fn set_left(&mut self, candidate: Option<usize>) -> bool {
        let Some(new) = candidate else { return false };
        if new < self.left_min || new > self.left_max {
            return false;
        }
        let old = self.position.left;
        self.position.left = new;
        self.listeners
            .notify(&RegionEvent::HorizontalMove { old, new });
        true
    }

    fn set_top(&mut self, candidate: Option<usize>) -> bool {
        let Some(new) = candidate else { return false };
        if new < self.top_min || new > self.top_max {
            return false;
        }
        let old = self.position.top;
        self.position.top = new;
        self.listeners
            .notify(&RegionEvent::VerticalMove { old, new });
        true
    }

    pub fn left(&self) -> usize {
        self.position.left
    }

    pub fn top(&self) -> usize {
        self.position.top
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Last buffer row currently inside the region.
    pub fn bottom(&self) -> usize {
        self.position.top + self.size.height.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn region_5x3() -> Region {
        // No horizontal scroll (right bound pinned to own width), ten rows of
        // vertical extent: effective max top = 10 - 3 = 7.
        Region::new(
            Size {
                width: 5,
                height: 3,
            },
            Position { left: 0, top: 0 },
            Constraint::default(),
            Constraint::to(0, 10),
        )
    }

    fn record_events(region: &mut Region) -> Rc<RefCell<Vec<RegionEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        region.register_listener(move |e| sink.borrow_mut().push(*e));
        events
    }

    #[test]
    fn scrolls_down_until_the_derived_maximum() {
        let mut region = region_5x3();
        for _ in 0..7 {
            assert!(region.scroll(Move::Down(1)));
        }
        assert_eq!(region.top(), 7);

        // The eighth step would leave the constrained range.
        assert!(!region.scroll(Move::Down(1)));
        assert_eq!(region.top(), 7);
    }

    #[test]
    fn rejected_moves_are_side_effect_free() {
        let mut region = region_5x3();
        let events = record_events(&mut region);

        assert!(!region.scroll(Move::Up(1)));
        assert!(!region.scroll(Move::Left(1)));
        assert!(!region.scroll(Move::Right(1)));

        assert_eq!(region.top(), 0);
        assert_eq!(region.left(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn accepted_moves_emit_old_and_new_offsets() {
        let mut region = region_5x3();
        let events = record_events(&mut region);

        assert!(region.scroll(Move::Down(1)));
        assert!(region.scroll(Move::Bottom));

        assert_eq!(
            *events.borrow(),
            vec![
                RegionEvent::VerticalMove { old: 0, new: 1 },
                RegionEvent::VerticalMove { old: 1, new: 7 },
            ]
        );
    }

    #[test]
    fn set_bottom_places_the_row_on_the_last_line() {
        let mut region = region_5x3();
        assert!(region.scroll(Move::SetBottom(6)));
        assert_eq!(region.top(), 4);
        assert_eq!(region.bottom(), 6);
    }

    #[test]
    fn set_top_outside_the_constraints_is_rejected() {
        let mut region = region_5x3();
        assert!(!region.scroll(Move::SetTop(8)));
        assert_eq!(region.top(), 0);
    }

    #[test]
    fn horizontal_constraints_derive_from_a_wider_extent() {
        let mut region = Region::new(
            Size {
                width: 10,
                height: 2,
            },
            Position { left: 3, top: 0 },
            Constraint::to(3, 40),
            Constraint::default(),
        );

        assert!(region.scroll(Move::End));
        assert_eq!(region.left(), 30);
        assert!(region.scroll(Move::Begin));
        assert_eq!(region.left(), 3);
        assert!(!region.scroll(Move::Left(1)));
    }

    #[test]
    fn containment_holds_under_arbitrary_move_sequences() {
        let mut region = Region::new(
            Size {
                width: 4,
                height: 4,
            },
            Position { left: 2, top: 1 },
            Constraint::to(2, 30),
            Constraint::to(1, 20),
        );

        let moves = [
            Move::Down(3),
            Move::Right(9),
            Move::Up(20),
            Move::Bottom,
            Move::End,
            Move::Down(1),
            Move::Left(2),
            Move::Top,
            Move::SetBottom(12),
            Move::Begin,
            Move::SetTop(0),
        ];
        for m in moves {
            region.scroll(m);
            assert!((2..=26).contains(&region.left()), "left={}", region.left());
            assert!((1..=16).contains(&region.top()), "top={}", region.top());
        }
    }

    #[test]
    fn extent_narrower_than_the_window_rejects_all_scrolling() {
        // A 3-cell extent behind a 10-cell window: nowhere to go.
        let mut region = Region::new(
            Size {
                width: 10,
                height: 2,
            },
            Position { left: 0, top: 0 },
            Constraint::to(0, 3),
            Constraint::default(),
        );
        assert!(!region.scroll(Move::Right(1)));
        assert!(!region.scroll(Move::Left(1)));
        assert_eq!(region.left(), 0);
    }
}
