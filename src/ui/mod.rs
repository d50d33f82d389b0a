//! Wires the main screen to the menu loop: visible task actions, hidden
//! navigation bindings, and the lifecycle listeners around each dispatch.

mod screen;

pub use screen::{MainScreen, UiError};

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::KeyConfig;
use crate::menu::{Flow, KeyPress, Menu, MenuEvent, MenuItem};
use crate::task::TaskWrapper;
use crate::term;

/// Load the initial report, build the screen and menu, and run the loop
/// until quit.
pub fn launch(cli: &Cli, keys: &KeyConfig) -> Result<(), UiError> {
    let wrapper = TaskWrapper::new(cli.task_data.clone());
    let title = Rc::new(RefCell::new("Main Menu".to_owned()));
    let screen = Rc::new(RefCell::new(MainScreen::new(
        wrapper,
        cli.report.clone(),
        cli.filter_terms(),
        cli.context.clone(),
        title.clone(),
    )?));

    let mut menu = build_main_menu(&screen, keys, title);

    term::install_panic_hook();
    let flow = menu.run()?;
    info!(?flow, "session ended");

    term::leave_key_mode()?;
    term::clear_screen()?;
    println!("Bye!");
    Ok(())
}

fn action_item(
    menu: &mut Menu,
    hotkey: KeyPress,
    title: &str,
    screen: &Rc<RefCell<MainScreen>>,
    action: fn(&mut MainScreen) -> Result<(), UiError>,
) {
    let screen = screen.clone();
    menu.add(MenuItem::new(hotkey, title, move || {
        action(&mut screen.borrow_mut())?;
        Ok(Flow::Continue)
    }));
}

fn nav_item(
    menu: &mut Menu,
    hotkey: KeyPress,
    screen: &Rc<RefCell<MainScreen>>,
    action: fn(&mut MainScreen),
) {
    let screen = screen.clone();
    menu.add(MenuItem::hidden(hotkey, move || {
        action(&mut screen.borrow_mut());
        Ok(Flow::Continue)
    }));
}

fn build_main_menu(
    screen: &Rc<RefCell<MainScreen>>,
    keys: &KeyConfig,
    title: Rc<RefCell<String>>,
) -> Menu {
    let mut menu = Menu::with_title_handle(title);

    action_item(&mut menu, KeyPress::char('a'), "Add", screen, MainScreen::task_add);
    action_item(&mut menu, KeyPress::char('n'), "Annotate", screen, MainScreen::task_annotate);
    action_item(&mut menu, KeyPress::char('O'), "Done", screen, MainScreen::task_done);
    action_item(&mut menu, KeyPress::char('v'), "View", screen, MainScreen::task_view);
    action_item(&mut menu, KeyPress::char('m'), "Mod", screen, MainScreen::task_mod);
    action_item(&mut menu, KeyPress::char('f'), "Filter", screen, MainScreen::task_filter);

    // Delete runs a nested confirmation menu; the screen borrow is released
    // before that inner loop blocks for input.
    let s = screen.clone();
    menu.add(MenuItem::new(KeyPress::char('D'), "Delete", move || {
        let ids = s.borrow().selected_ids()?;
        let mut confirm = Menu::new(&format!(
            "Are you sure you want to remove ids '{ids:?}'?"
        ));
        let confirmed = s.clone();
        confirm.add(MenuItem::back(
            KeyPress::char('y'),
            "Yes",
            Some(Rc::new(move || {
                confirmed.borrow_mut().delete_confirmed(&ids)?;
                Ok(Flow::Continue)
            })),
        ));
        confirm.add(MenuItem::back(KeyPress::char('n'), "No", None));
        confirm.run()?;
        Ok(Flow::Continue)
    }));

    action_item(&mut menu, KeyPress::char('U'), "Undo", screen, MainScreen::task_undo);
    action_item(&mut menu, KeyPress::char('R'), "Reload", screen, MainScreen::task_reload);
    action_item(&mut menu, KeyPress::char('S'), "Sync", screen, MainScreen::task_sync);
    menu.add(MenuItem::quit(keys.actions.quit));

    let nav = &keys.navigation;
    nav_item(&mut menu, nav.movement.next, screen, MainScreen::activate_next);
    nav_item(&mut menu, nav.movement.previous, screen, MainScreen::activate_previous);
    nav_item(&mut menu, nav.scroll.down, screen, MainScreen::viewer_down);
    nav_item(&mut menu, nav.scroll.up, screen, MainScreen::viewer_up);
    nav_item(&mut menu, nav.movement.first, screen, MainScreen::activate_first);
    nav_item(&mut menu, nav.movement.last, screen, MainScreen::activate_last);
    nav_item(&mut menu, nav.scroll.left, screen, MainScreen::viewer_left);
    nav_item(&mut menu, nav.scroll.right, screen, MainScreen::viewer_right);
    nav_item(&mut menu, nav.scroll.begin, screen, MainScreen::viewer_begin);
    nav_item(&mut menu, nav.scroll.end, screen, MainScreen::viewer_end);
    nav_item(&mut menu, nav.toggle_selected, screen, MainScreen::toggle_selected);

    let s = screen.clone();
    menu.register_listener(move |event| {
        if let MenuEvent::Render = event {
            s.borrow_mut().render();
        }
    });

    // interactive actions need the cursor and line input back, and leave the
    // screen to the task binary; everything repaints afterwards
    let s = screen.clone();
    menu.register_listener(move |event| {
        if let MenuEvent::ItemChosen(item) = event {
            if item.interactive {
                if let Err(err) = term::leave_key_mode().and_then(|()| term::clear_screen()) {
                    warn!(error = %err, "could not restore terminal");
                }
                s.borrow().invalidate_all();
            }
        }
    });

    menu.register_listener(move |event| {
        if let MenuEvent::AfterAction { item: Some(item) } = event {
            if item.interactive {
                if let Err(err) = term::leave_key_mode().and_then(|()| term::clear_screen()) {
                    warn!(error = %err, "could not restore terminal");
                }
            }
        }
    });

    let s = screen.clone();
    menu.register_listener(move |event| {
        if let MenuEvent::Resized { cols, rows } = event {
            s.borrow_mut().handle_resize(*cols, *rows);
        }
    });

    menu
}
