use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};

use crate::term::{Canvas, PaintStyle};
use crate::view::provider::DataProvider;
use crate::view::region::{Move, Region, RegionEvent};
use crate::view::selection::{Selection, SelectionEvent};

/// Paints the slice of the buffer inside one [`Region`] at a fixed screen
/// anchor, honoring an attached [`Selection`] for highlighting.
///
/// A viewer only observes: it subscribes to its region's and selection's
/// events at construction and repaints on [`update`](Viewer::update) when
/// anything it shows has changed since the last pass.
pub struct Viewer {
    provider: Rc<RefCell<DataProvider>>,
    region: Rc<RefCell<Region>>,
    selection: Option<Rc<RefCell<Selection>>>,
    screen_left: u16,
    screen_top: u16,
    dirty: Rc<Cell<bool>>,
}

impl Viewer {
    pub fn new(
        provider: Rc<RefCell<DataProvider>>,
        region: Rc<RefCell<Region>>,
        selection: Option<Rc<RefCell<Selection>>>,
        screen_left: u16,
        screen_top: u16,
    ) -> Self {
        let dirty = Rc::new(Cell::new(true));

        // Subscribers hold weak cross-references: region and selection
        // listeners pointing strongly at each other would keep every
        // discarded layout alive.
        {
            let mut r = region.borrow_mut();
            // height is fixed for the region's lifetime, so the subscriber can
            // carry it instead of re-borrowing the notifying region
            let height = r.height();
            let dirty = dirty.clone();
            let selection: Option<Weak<RefCell<Selection>>> =
                selection.as_ref().map(Rc::downgrade);
            r.register_listener(move |event| {
                if let RegionEvent::VerticalMove { new, .. } = event {
                    if let Some(selection) = selection.as_ref().and_then(Weak::upgrade) {
                        // A vertical move may arrive mid-notify from the
                        // cursor-follow path; the cursor is in range then and
                        // the selection is unavailable, so skipping is sound.
                        if let Ok(mut selection) = selection.try_borrow_mut() {
                            selection.clamp_to(*new, new + height.saturating_sub(1));
                        }
                    }
                }
                dirty.set(true);
            });
        }

        if let Some(sel) = &selection {
            let dirty = dirty.clone();
            let region = Rc::downgrade(&region);
            sel.borrow_mut().register_listener(move |event| {
                if let SelectionEvent::CursorMoved { new, .. } = event {
                    if let Some(region) = region.upgrade() {
                        let (top, bottom) = {
                            let r = region.borrow();
                            (r.top(), r.bottom())
                        };
                        if *new > bottom {
                            region.borrow_mut().scroll(Move::SetBottom(*new));
                        } else if *new < top {
                            region.borrow_mut().scroll(Move::SetTop(*new));
                        }
                    }
                }
                dirty.set(true);
            });
        }

        Viewer {
            provider,
            region,
            selection,
            screen_left,
            screen_top,
            dirty,
        }
    }

    /// Force a repaint on the next [`update`](Viewer::update), regardless of
    /// observed changes. Used after structural changes like a resize.
    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// The region this viewer looks through, for scroll actions.
    pub fn region(&self) -> &Rc<RefCell<Region>> {
        &self.region
    }

    /// Repaint if dirty, then clear the flag. A clean viewer is a no-op.
    pub fn update(&mut self, canvas: &mut dyn Canvas) -> io::Result<()> {
        if !self.dirty.get() {
            return Ok(());
        }

        let provider = self.provider.borrow();
        let region = self.region.borrow();
        let selection = self.selection.as_ref().map(|s| s.borrow());

        let width = region.width();
        let mut printed: u16 = 0;

        for (row, raw_line) in provider.lines().iter().enumerate().skip(region.top()) {
            if printed as usize == region.height() {
                break;
            }

            let mut text = String::with_capacity(width);
            let mut cells = 0;
            for ch in raw_line.chars().skip(region.left()).take(width) {
                text.push(ch);
                cells += 1;
            }
            while text.ends_with('\n') {
                text.pop();
                cells -= 1;
            }
            // pad to the full region width so stale cells and highlights are
            // overwritten edge to edge
            for _ in cells..width {
                text.push(' ');
            }

            let style = match selection.as_deref() {
                Some(sel) if sel.active_line() == row => {
                    if sel.is_selected(row) {
                        PaintStyle::CursorSelected
                    } else {
                        PaintStyle::Cursor
                    }
                }
                Some(sel) if sel.is_selected(row) => PaintStyle::Selected,
                _ => PaintStyle::Plain,
            };

            canvas.put(self.screen_left, self.screen_top + printed, &text, style)?;
            printed += 1;
        }

        self.dirty.set(false);
        Ok(())
    }
}
