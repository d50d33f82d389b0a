//! Hotkey bindings and the blocking single-key dispatch loop.

mod key;

pub use key::{KeyParseError, KeyPress};

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use thiserror::Error;
use tracing::{debug, error};

use crate::event::{ListenerId, Listeners};
use crate::term;
use crate::util::truncate_to_width;

/// What the loop should do after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    Back,
}

/// How a "continue" result from the action is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Plain,
    Quit,
    Back,
}

pub type Action = Rc<dyn Fn() -> Result<Flow, Box<dyn std::error::Error>>>;

/// One hotkey binding: a key, a legend title, an optional action, and the
/// visibility/interactivity flags.
pub struct MenuItem {
    pub hotkey: KeyPress,
    pub title: String,
    action: Option<Action>,
    /// Shown in the rendered key legend.
    pub visible: bool,
    /// Terminal chrome (cursor, line input) must be restored around the
    /// action; the loop otherwise keeps the terminal in single-key mode.
    pub interactive: bool,
    kind: ItemKind,
}

impl MenuItem {
    pub fn new(
        hotkey: KeyPress,
        title: &str,
        action: impl Fn() -> Result<Flow, Box<dyn std::error::Error>> + 'static,
    ) -> Self {
        MenuItem {
            hotkey,
            title: title.to_owned(),
            action: Some(Rc::new(action)),
            visible: true,
            interactive: true,
            kind: ItemKind::Plain,
        }
    }

    /// An invisible, non-interactive binding; used for navigation keys.
    pub fn hidden(
        hotkey: KeyPress,
        action: impl Fn() -> Result<Flow, Box<dyn std::error::Error>> + 'static,
    ) -> Self {
        MenuItem {
            hotkey,
            title: String::new(),
            action: Some(Rc::new(action)),
            visible: false,
            interactive: false,
            kind: ItemKind::Plain,
        }
    }

    /// A binding whose "continue" outcome becomes [`Flow::Quit`].
    pub fn quit(hotkey: KeyPress) -> Self {
        MenuItem {
            hotkey,
            title: "Quit".to_owned(),
            action: None,
            visible: true,
            interactive: true,
            kind: ItemKind::Quit,
        }
    }

    /// A binding whose "continue" outcome becomes [`Flow::Back`].
    pub fn back(
        hotkey: KeyPress,
        title: &str,
        action: Option<Action>,
    ) -> Self {
        MenuItem {
            hotkey,
            title: title.to_owned(),
            action,
            visible: true,
            interactive: true,
            kind: ItemKind::Back,
        }
    }

    fn run(&self) -> Result<Flow, Box<dyn std::error::Error>> {
        let flow = match &self.action {
            Some(action) => action()?,
            None => Flow::Continue,
        };
        // an explicit signal from the action wins over the item kind
        Ok(match (flow, self.kind) {
            (Flow::Continue, ItemKind::Quit) => Flow::Quit,
            (Flow::Continue, ItemKind::Back) => Flow::Back,
            (flow, _) => flow,
        })
    }
}

/// Metadata about a matched binding, handed to lifecycle listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChosenItem {
    pub interactive: bool,
}

/// Lifecycle events fired around each dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    /// The loop is about to paint a frame; refresh viewers now.
    Render,
    /// A binding matched and its action is about to run.
    ItemChosen(ChosenItem),
    /// Dispatch finished; `item` is `None` when no binding matched.
    AfterAction { item: Option<ChosenItem> },
    /// The terminal changed size, out-of-band from any keystroke.
    Resized { cols: u16, rows: u16 },
}

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// The blocking dispatch loop: an ordered binding list, a legend, and the
/// lifecycle listener registry.
pub struct Menu {
    title: Rc<RefCell<String>>,
    items: Vec<MenuItem>,
    legend: String,
    last_error: Option<String>,
    listeners: Listeners<MenuEvent>,
}

impl Menu {
    pub fn new(title: &str) -> Self {
        Self::with_title_handle(Rc::new(RefCell::new(title.to_owned())))
    }

    /// Build around an existing title cell, shared with whoever retitles the
    /// menu while it runs.
    pub fn with_title_handle(title: Rc<RefCell<String>>) -> Self {
        Menu {
            title,
            items: Vec::new(),
            legend: String::new(),
            last_error: None,
            listeners: Listeners::new(),
        }
    }

    /// Shared handle to the title, so actions can retitle the running menu.
    pub fn title_handle(&self) -> Rc<RefCell<String>> {
        self.title.clone()
    }

    pub fn add(&mut self, item: MenuItem) {
        self.items.push(item);
    }

    pub fn register_listener(
        &mut self,
        listener: impl FnMut(&MenuEvent) + 'static,
    ) -> ListenerId {
        self.listeners.register(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    /// The key legend built from the visible bindings.
    pub fn legend(&self) -> String {
        let entries: Vec<String> = self
            .items
            .iter()
            .filter(|item| item.visible)
            .map(|item| format!("{} {}", item.hotkey, item.title))
            .collect();
        entries.join("  ")
    }

    /// Run until a binding resolves to quit or back.
    ///
    /// Each iteration: render listeners → chrome → one blocking event read.
    /// Resizes are routed to listeners without consuming a keystroke.
    pub fn run(&mut self) -> Result<Flow, MenuError> {
        term::clear_screen()?;
        self.legend = self.legend();

        loop {
            term::enter_key_mode()?;
            self.listeners.notify(&MenuEvent::Render);
            self.paint_chrome()?;

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match self.dispatch_key(KeyPress::from(key)) {
                        Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                }
                Event::Resize(cols, rows) => {
                    debug!(cols, rows, "terminal resized");
                    self.listeners.notify(&MenuEvent::Resized { cols, rows });
                }
                _ => {}
            }
        }
    }

    /// Match `key` against the bindings in registration order and run the
    /// first hit. A failed action is reported and the loop continues; only
    /// quit/back outcomes end it.
    pub fn dispatch_key(&mut self, key: KeyPress) -> Flow {
        let Some(index) = self.items.iter().position(|item| item.hotkey == key) else {
            self.listeners.notify(&MenuEvent::AfterAction { item: None });
            return Flow::Continue;
        };

        let chosen = ChosenItem {
            interactive: self.items[index].interactive,
        };
        self.listeners.notify(&MenuEvent::ItemChosen(chosen));

        let result = self.items[index].run();
        let flow = match result {
            Ok(flow) => {
                self.last_error = None;
                flow
            }
            Err(err) => {
                error!(key = %key, error = %err, "action failed");
                self.last_error = Some(err.to_string());
                Flow::Continue
            }
        };

        self.listeners.notify(&MenuEvent::AfterAction {
            item: Some(chosen),
        });
        flow
    }

    /// Title and legend on the bottom two rows, truncated to the width.
    fn paint_chrome(&self) -> io::Result<()> {
        let (cols, rows) = term::size()?;
        if rows < 2 {
            return Ok(());
        }
        let width = cols.saturating_sub(1) as usize;

        let title = match &self.last_error {
            Some(err) => format!("[{}] error: {}", self.title.borrow(), err),
            None => format!("[{}]", self.title.borrow()),
        };

        execute!(
            io::stdout(),
            MoveTo(0, rows - 2),
            Clear(ClearType::CurrentLine),
            Print(truncate_to_width(&title, width)),
            MoveTo(0, rows - 1),
            Clear(ClearType::CurrentLine),
            Print(truncate_to_width(&self.legend, width)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn legend_lists_visible_items_in_order() {
        let mut menu = Menu::new("Main");
        menu.add(MenuItem::new(KeyPress::char('a'), "Add", || {
            Ok(Flow::Continue)
        }));
        menu.add(MenuItem::hidden(KeyPress::char('j'), || Ok(Flow::Continue)));
        menu.add(MenuItem::quit(KeyPress::char('q')));

        assert_eq!(menu.legend(), "a Add  q Quit");
    }

    #[test]
    fn dispatch_runs_the_first_matching_binding() {
        let hits = Rc::new(Cell::new(0));
        let mut menu = Menu::new("Main");
        let h = hits.clone();
        menu.add(MenuItem::new(KeyPress::char('a'), "First", move || {
            h.set(h.get() + 1);
            Ok(Flow::Continue)
        }));
        menu.add(MenuItem::new(KeyPress::char('a'), "Shadowed", || {
            panic!("second binding must not run")
        }));

        assert_eq!(menu.dispatch_key(KeyPress::char('a')), Flow::Continue);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unmatched_keys_still_fire_after_action_with_no_item() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut menu = Menu::new("Main");
        let sink = events.clone();
        menu.register_listener(move |e| sink.borrow_mut().push(*e));

        assert_eq!(menu.dispatch_key(KeyPress::char('z')), Flow::Continue);
        assert_eq!(
            *events.borrow(),
            vec![MenuEvent::AfterAction { item: None }]
        );
    }

    #[test]
    fn lifecycle_events_fire_around_a_matched_action() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut menu = Menu::new("Main");
        let sink = events.clone();
        menu.register_listener(move |e| sink.borrow_mut().push(*e));
        menu.add(MenuItem::new(KeyPress::char('a'), "Add", || {
            Ok(Flow::Continue)
        }));

        menu.dispatch_key(KeyPress::char('a'));

        let chosen = ChosenItem { interactive: true };
        assert_eq!(
            *events.borrow(),
            vec![
                MenuEvent::ItemChosen(chosen),
                MenuEvent::AfterAction { item: Some(chosen) },
            ]
        );
    }

    #[test]
    fn quit_and_back_normalize_a_continue_result() {
        let mut menu = Menu::new("Main");
        menu.add(MenuItem::quit(KeyPress::char('q')));
        menu.add(MenuItem::back(KeyPress::char('b'), "Back", None));

        assert_eq!(menu.dispatch_key(KeyPress::char('q')), Flow::Quit);
        assert_eq!(menu.dispatch_key(KeyPress::char('b')), Flow::Back);
    }

    #[test]
    fn an_explicit_signal_overrides_the_item_kind() {
        let mut menu = Menu::new("Confirm");
        menu.add(MenuItem::back(
            KeyPress::char('y'),
            "Yes",
            Some(Rc::new(|| Ok(Flow::Quit))),
        ));
        assert_eq!(menu.dispatch_key(KeyPress::char('y')), Flow::Quit);
    }

    #[test]
    fn a_failing_action_reports_and_continues() {
        let mut menu = Menu::new("Main");
        menu.add(MenuItem::new(KeyPress::char('x'), "Boom", || {
            Err("task binary exploded".into())
        }));

        assert_eq!(menu.dispatch_key(KeyPress::char('x')), Flow::Continue);
        assert_eq!(menu.last_error.as_deref(), Some("task binary exploded"));

        // the next successful dispatch clears the report
        menu.add(MenuItem::new(KeyPress::char('o'), "Ok", || {
            Ok(Flow::Continue)
        }));
        menu.dispatch_key(KeyPress::char('o'));
        assert!(menu.last_error.is_none());
    }
}
