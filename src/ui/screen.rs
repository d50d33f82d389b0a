use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use thiserror::Error;
use tracing::{info, warn};

use crate::menu::MenuError;
use crate::task::{ReportError, ReportParser, TaskWrapper, WrapperError};
use crate::term::{self, Canvas, TermCanvas};
use crate::view::{
    Constraint, CursorDir, DataProvider, Move, Position, Region, RowRange, Selection, Size, Viewer,
};

#[derive(Debug, Error)]
pub enum UiError {
    #[error(transparent)]
    Wrapper(#[from] WrapperError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("no task on the active line")]
    NoActiveTask,
}

/// Task output starts with a blank line; the report begins on row 1.
const FIRST_USABLE_LINE: usize = 1;
/// Header rows pinned above the scrolling area.
const FIXED_TOP: usize = 2;
/// Bottom rows reserved for the menu title and legend.
const MENU_HEIGHT: usize = 2;
/// Trailing task-count/footer lines of the report, kept out of the cursor range.
const FOOTER_HEIGHT: usize = 2;

const PRESS_ANY_KEY: &str = "Press any key to continue...";

fn split_words(input: &str) -> Vec<String> {
    input.split(' ').map(str::to_owned).collect()
}

/// The four viewers of the main screen and the selection they share.
///
/// Rebuilt wholesale on every reload and resize; subscriptions are
/// re-established by the viewer constructors each time.
pub(crate) struct Layout {
    corner: Viewer,
    header: Viewer,
    id_column: Viewer,
    data: Viewer,
    selection: Rc<RefCell<Selection>>,
}

impl Layout {
    /// Derive the viewer arrangement from the terminal size and the parsed
    /// ID column width.
    ///
    /// Corner and ID-column viewers cover the ID column; header and data
    /// viewers share the horizontal scroll extent; ID-column and data
    /// viewers share the vertical extent and the selection.
    fn build(
        provider: &Rc<RefCell<DataProvider>>,
        parser: &ReportParser,
        cols: u16,
        rows: u16,
    ) -> Self {
        let buffer = provider.borrow().size();
        let has_data = buffer.line_count > 1;
        let fixed_left = if has_data {
            parser.id_column_width().unwrap_or(0)
        } else {
            0
        };

        let corner_region = Region::new(
            Size {
                width: fixed_left,
                height: FIXED_TOP,
            },
            Position {
                left: 0,
                top: FIRST_USABLE_LINE,
            },
            Constraint::default(),
            Constraint::default(),
        );
        let corner = Viewer::new(
            provider.clone(),
            Rc::new(RefCell::new(corner_region)),
            None,
            0,
            0,
        );

        let data_width = (cols as usize).saturating_sub(fixed_left + 1);
        let horizontal = Constraint::to(fixed_left, buffer.widest_line);

        let header_region = Region::new(
            Size {
                width: data_width,
                height: FIXED_TOP,
            },
            Position {
                left: fixed_left,
                top: FIRST_USABLE_LINE,
            },
            horizontal,
            Constraint::default(),
        );
        let header = Viewer::new(
            provider.clone(),
            Rc::new(RefCell::new(header_region)),
            None,
            fixed_left as u16,
            0,
        );

        let data_height = (rows as usize).saturating_sub(FIXED_TOP + MENU_HEIGHT);
        let data_top = FIRST_USABLE_LINE + FIXED_TOP;
        let data_bottom = buffer.line_count.saturating_sub(FOOTER_HEIGHT + 1);
        let vertical = Constraint::to(data_top, data_bottom);

        let selection = Rc::new(RefCell::new(Selection::new(
            data_top,
            Some(RowRange {
                top: data_top,
                bottom: data_bottom,
            }),
        )));

        let id_region = Region::new(
            Size {
                width: fixed_left,
                height: data_height,
            },
            Position {
                left: 0,
                top: data_top,
            },
            Constraint::default(),
            vertical,
        );
        let id_column = Viewer::new(
            provider.clone(),
            Rc::new(RefCell::new(id_region)),
            Some(selection.clone()),
            0,
            FIXED_TOP as u16,
        );

        let data_region = Region::new(
            Size {
                width: data_width,
                height: data_height,
            },
            Position {
                left: fixed_left,
                top: data_top,
            },
            horizontal,
            vertical,
        );
        let data = Viewer::new(
            provider.clone(),
            Rc::new(RefCell::new(data_region)),
            Some(selection.clone()),
            fixed_left as u16,
            FIXED_TOP as u16,
        );

        Layout {
            corner,
            header,
            id_column,
            data,
            selection,
        }
    }
}

/// Application state behind the main menu: the wrapper, the loaded report,
/// the parsed header, and the current viewer layout.
pub struct MainScreen {
    wrapper: TaskWrapper,
    data_changed: Rc<Cell<bool>>,
    provider: Rc<RefCell<DataProvider>>,
    parser: ReportParser,
    report: Option<String>,
    filters: Option<Vec<String>>,
    context: Option<String>,
    title: Rc<RefCell<String>>,
    layout: Layout,
}

impl MainScreen {
    pub fn new(
        mut wrapper: TaskWrapper,
        report: Option<String>,
        filters: Option<Vec<String>>,
        context: Option<String>,
        title: Rc<RefCell<String>>,
    ) -> Result<Self, UiError> {
        let data_changed = Rc::new(Cell::new(false));
        {
            let flag = data_changed.clone();
            wrapper.register_listener(move |_| flag.set(true));
        }

        let provider = Rc::new(RefCell::new(DataProvider::new()));
        let mut parser = ReportParser::new();

        let text = wrapper.load(report.as_deref(), filters.as_deref(), context.as_deref())?;
        provider.borrow_mut().update(&text);
        Self::reparse_header(&provider, &mut parser)?;

        let (cols, rows) = term::size()?;
        let layout = Layout::build(&provider, &parser, cols, rows);

        let screen = MainScreen {
            wrapper,
            data_changed,
            provider,
            parser,
            report,
            filters,
            context,
            title,
            layout,
        };
        screen.refresh_titles();
        Ok(screen)
    }

    fn reparse_header(
        provider: &Rc<RefCell<DataProvider>>,
        parser: &mut ReportParser,
    ) -> Result<(), ReportError> {
        let provider = provider.borrow();
        if provider.size().line_count > 1 {
            if let Some(header) = provider.line(FIRST_USABLE_LINE) {
                parser.set_header_line(header)?;
            }
        }
        Ok(())
    }

    /// Rerun the report and rebuild the layout from scratch.
    fn reload(&mut self) -> Result<(), UiError> {
        info!(report = ?self.report, filters = ?self.filters, "reloading report");
        let text = self.wrapper.load(
            self.report.as_deref(),
            self.filters.as_deref(),
            self.context.as_deref(),
        )?;
        self.provider.borrow_mut().update(&text);
        Self::reparse_header(&self.provider, &mut self.parser)?;
        self.refresh_titles();
        let (cols, rows) = term::size()?;
        self.layout = Layout::build(&self.provider, &self.parser, cols, rows);
        Ok(())
    }

    fn refresh_if_changed(&mut self) -> Result<(), UiError> {
        if !self.data_changed.get() {
            return Ok(());
        }
        self.data_changed.set(false);
        self.reload()
    }

    /// Repaint every dirty viewer. Called from the menu's render event; a
    /// failure keeps the previous frame and is logged, never fatal.
    pub fn render(&mut self) {
        if let Err(err) = self.refresh_if_changed() {
            warn!(error = %err, "reload failed; keeping previous data");
        }
        let mut canvas = TermCanvas::stdout();
        if let Err(err) = self.paint(&mut canvas) {
            warn!(error = %err, "render failed");
        }
    }

    fn paint(&mut self, canvas: &mut dyn Canvas) -> io::Result<()> {
        self.layout.corner.update(canvas)?;
        self.layout.header.update(canvas)?;
        self.layout.id_column.update(canvas)?;
        self.layout.data.update(canvas)?;
        canvas.flush()
    }

    /// Force a full repaint of every viewer on the next render pass.
    pub fn invalidate_all(&self) {
        self.layout.corner.invalidate();
        self.layout.header.invalidate();
        self.layout.id_column.invalidate();
        self.layout.data.invalidate();
    }

    /// Rebuild the layout for the new terminal size. The previous layout is
    /// kept when the rebuild fails.
    pub fn handle_resize(&mut self, cols: u16, rows: u16) {
        info!(cols, rows, "rebuilding layout");
        self.layout = Layout::build(&self.provider, &self.parser, cols, rows);
        if let Err(err) = term::clear_screen() {
            warn!(error = %err, "could not clear after resize");
        }
    }

    /// Menu title and terminal title: active filters plus the report's own
    /// task-count footer line.
    fn refresh_titles(&self) {
        let provider = self.provider.borrow();
        let size = provider.size();

        let filters = self
            .filters
            .as_ref()
            .map(|f| f.join(" and "))
            .unwrap_or_default();
        let task_count = if size.line_count > 1 {
            provider
                .line(size.line_count - 2)
                .unwrap_or_default()
                .to_owned()
        } else {
            "no tasks".to_owned()
        };

        let separator = if filters.is_empty() { "" } else { "; " };
        if let Err(err) = term::set_title(&format!("taskdeck [{filters}{separator}{task_count}]")) {
            warn!(error = %err, "could not set terminal title");
        }

        let filter_string = if filters.is_empty() {
            String::new()
        } else {
            format!("; filter={filters}")
        };
        *self.title.borrow_mut() = format!("Main Menu{filter_string}; {task_count}");
    }

    fn active_id(&self) -> Option<u32> {
        let provider = self.provider.borrow();
        let line = provider.line(self.layout.selection.borrow().active_line())?;
        self.parser.task_id(line)
    }

    /// Ids to operate on: the selection set in toggle order, or the active
    /// line's id when nothing is toggled.
    pub fn selected_ids(&self) -> Result<Vec<u32>, UiError> {
        let selection = self.layout.selection.borrow();
        if !selection.has_selection() {
            return Ok(vec![self.active_id().ok_or(UiError::NoActiveTask)?]);
        }
        let provider = self.provider.borrow();
        let ids: Vec<u32> = selection
            .selected_lines()
            .filter_map(|line| provider.line(line).and_then(|l| self.parser.task_id(l)))
            .collect();
        if ids.is_empty() {
            return Err(UiError::NoActiveTask);
        }
        Ok(ids)
    }

    // Menu actions. All of these run with the terminal back in line-buffered
    // mode; the loop restores single-key mode on the next iteration.

    pub fn task_add(&mut self) -> Result<(), UiError> {
        let parameters = term::prompt("task add [empty for cancel]: ")?;
        if parameters.is_empty() {
            return Ok(());
        }
        self.wrapper.add(&split_words(&parameters))?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_annotate(&mut self) -> Result<(), UiError> {
        let id = self.active_id().ok_or(UiError::NoActiveTask)?;
        let annotation = term::prompt(&format!("task {id} annotate [empty for cancel]: "))?;
        if annotation.is_empty() {
            return Ok(());
        }
        self.wrapper.annotate(id, &split_words(&annotation))?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_done(&mut self) -> Result<(), UiError> {
        let ids = self.selected_ids()?;
        self.wrapper.done(&ids)?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_view(&mut self) -> Result<(), UiError> {
        let ids = self.selected_ids()?;
        self.wrapper.view(&ids)?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_mod(&mut self) -> Result<(), UiError> {
        let ids = self.selected_ids()?;
        let modifications = term::prompt(&format!("task {ids:?} mod [empty for cancel]: "))?;
        if modifications.is_empty() {
            return Ok(());
        }
        self.wrapper.modify(&ids, &split_words(&modifications))?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_filter(&mut self) -> Result<(), UiError> {
        let input = term::prompt("Enter new filters [::cancel for cancel, empty for clear]: ")?;
        if input == "::cancel" {
            return Ok(());
        }
        self.filters = if input.is_empty() {
            None
        } else {
            Some(split_words(&input))
        };
        self.refresh_titles();
        self.wrapper.invalidate_data();
        Ok(())
    }

    pub fn delete_confirmed(&mut self, ids: &[u32]) -> Result<(), UiError> {
        println!();
        self.wrapper.delete(ids)?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_undo(&mut self) -> Result<(), UiError> {
        self.wrapper.undo()?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_reload(&mut self) -> Result<(), UiError> {
        println!("Reloading data...");
        self.wrapper.invalidate_data();
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    pub fn task_sync(&mut self) -> Result<(), UiError> {
        println!("Sync command...");
        self.wrapper.sync()?;
        term::wait(PRESS_ANY_KEY)?;
        Ok(())
    }

    // Navigation: the cursor for next/previous, the viewports for the rest.
    // The cursor drags the data viewports along through their subscriptions.

    pub fn activate_next(&mut self) {
        self.layout
            .selection
            .borrow_mut()
            .move_cursor(CursorDir::Down, 1);
    }

    pub fn activate_previous(&mut self) {
        self.layout
            .selection
            .borrow_mut()
            .move_cursor(CursorDir::Up, 1);
    }

    pub fn activate_first(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Top);
        self.layout.id_column.region().borrow_mut().scroll(Move::Top);
    }

    pub fn activate_last(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Bottom);
        self.layout
            .id_column
            .region()
            .borrow_mut()
            .scroll(Move::Bottom);
    }

    pub fn viewer_down(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Down(1));
        self.layout
            .id_column
            .region()
            .borrow_mut()
            .scroll(Move::Down(1));
    }

    pub fn viewer_up(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Up(1));
        self.layout
            .id_column
            .region()
            .borrow_mut()
            .scroll(Move::Up(1));
    }

    pub fn viewer_left(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Left(1));
        self.layout.header.region().borrow_mut().scroll(Move::Left(1));
    }

    pub fn viewer_right(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Right(1));
        self.layout
            .header
            .region()
            .borrow_mut()
            .scroll(Move::Right(1));
    }

    pub fn viewer_begin(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::Begin);
        self.layout.header.region().borrow_mut().scroll(Move::Begin);
    }

    pub fn viewer_end(&mut self) {
        self.layout.data.region().borrow_mut().scroll(Move::End);
        self.layout.header.region().borrow_mut().scroll(Move::End);
    }

    pub fn toggle_selected(&mut self) {
        self.layout.selection.borrow_mut().toggle_active_line_selected();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_report() -> String {
        let mut lines = vec![
            "".to_owned(),
            "ID Description".to_owned(),
            "-- -----------".to_owned(),
        ];
        for id in 1..=20 {
            lines.push(format!("{id:>2} task number {id}"));
        }
        lines.push("".to_owned());
        lines.push("20 tasks".to_owned());
        // real task output ends with a newline, so a final empty line
        lines.push("".to_owned());
        lines.join("\n")
    }

    fn layout_for(cols: u16, rows: u16) -> (Rc<RefCell<DataProvider>>, Layout) {
        let provider = Rc::new(RefCell::new(DataProvider::new()));
        provider.borrow_mut().update(&fake_report());
        let mut parser = ReportParser::new();
        MainScreen::reparse_header(&provider, &mut parser).unwrap();
        let layout = Layout::build(&provider, &parser, cols, rows);
        (provider, layout)
    }

    #[test]
    fn layout_derives_regions_from_terminal_and_header() {
        let (_provider, layout) = layout_for(80, 24);

        // header "ID Description" puts the ID column at width 3
        let data_region = layout.data.region().borrow();
        assert_eq!(data_region.left(), 3);
        assert_eq!(data_region.width(), 80 - 3 - 1);
        assert_eq!(data_region.height(), 24 - FIXED_TOP - MENU_HEIGHT);
        assert_eq!(data_region.top(), 3);

        let id_region = layout.id_column.region().borrow();
        assert_eq!(id_region.left(), 0);
        assert_eq!(id_region.width(), 3);
    }

    #[test]
    fn cursor_starts_on_the_first_task_row() {
        let (_provider, layout) = layout_for(80, 24);
        assert_eq!(layout.selection.borrow().active_line(), 3);
    }

    #[test]
    fn cursor_cannot_enter_the_footer() {
        let (provider, layout) = layout_for(80, 24);
        let last_task_row = provider.borrow().size().line_count - FOOTER_HEIGHT - 2;

        let mut moved = 0;
        while layout
            .selection
            .borrow_mut()
            .move_cursor(CursorDir::Down, 1)
        {
            moved += 1;
            assert!(moved < 100, "cursor escaped its range");
        }
        assert_eq!(layout.selection.borrow().active_line(), last_task_row);
    }

    #[test]
    fn tiny_terminals_never_underflow() {
        let (_provider, layout) = layout_for(2, 3);
        layout.data.region().borrow_mut().scroll(Move::Down(1));
        layout.data.region().borrow_mut().scroll(Move::Up(1));
        let top = layout.data.region().borrow().top();
        let cursor = layout.selection.borrow().active_line();
        assert!(cursor >= top);
    }
}
