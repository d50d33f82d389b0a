use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::event::{ListenerId, Listeners};

/// Fired after any mutating invocation; the screen reloads on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperEvent {
    DataChanged,
}

#[derive(Debug, Error)]
pub enum WrapperError {
    #[error("the task binary was not found on PATH")]
    BinaryNotFound,
    #[error("could not run task: {0}")]
    Io(#[from] io::Error),
}

/// Process wrapper around Taskwarrior.
///
/// Loads capture stdout; mutating operations run uncaptured so the binary
/// can talk to the terminal directly (confirmations, undo output). Every
/// mutating operation publishes [`WrapperEvent::DataChanged`].
pub struct TaskWrapper {
    task_data: Option<String>,
    listeners: Listeners<WrapperEvent>,
}

/// `rc` overrides forced onto every load so the report parses the same way
/// regardless of user configuration.
const LOAD_OVERRIDES: [&str; 3] = ["rc.defaultwidth:", "rc._forcecolor:off", "rc.color:off"];

fn load_args(
    report: Option<&str>,
    filters: Option<&[String]>,
    context: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = LOAD_OVERRIDES.iter().map(|s| (*s).to_owned()).collect();
    if let Some(context) = context {
        args.push(format!("rc.context:{context}"));
    }
    if let Some(report) = report {
        args.push(report.to_owned());
    }
    if let Some(filters) = filters {
        args.extend(filters.iter().cloned());
    }
    args
}

fn map_spawn_error(err: io::Error) -> WrapperError {
    if err.kind() == io::ErrorKind::NotFound {
        WrapperError::BinaryNotFound
    } else {
        WrapperError::Io(err)
    }
}

impl TaskWrapper {
    pub fn new(task_data: Option<String>) -> Self {
        TaskWrapper {
            task_data,
            listeners: Listeners::new(),
        }
    }

    pub fn register_listener(
        &mut self,
        listener: impl FnMut(&WrapperEvent) + 'static,
    ) -> ListenerId {
        self.listeners.register(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn command(&self) -> Command {
        let mut command = Command::new("task");
        if let Some(task_data) = &self.task_data {
            command.env("TASKDATA", task_data);
        }
        command
    }

    /// Run the report and return its decoded output.
    pub fn load(
        &self,
        report: Option<&str>,
        filters: Option<&[String]>,
        context: Option<&str>,
    ) -> Result<String, WrapperError> {
        let args = load_args(report, filters, context);
        debug!(?args, "loading report");
        let output = self.command().args(&args).output().map_err(map_spawn_error)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run an uncaptured invocation; the binary inherits the terminal.
    fn run_interactive(&self, args: &[String]) -> Result<(), WrapperError> {
        debug!(?args, "running task");
        // a nonzero exit already printed its own message to the terminal
        self.command()
            .args(args)
            .status()
            .map_err(map_spawn_error)?;
        Ok(())
    }

    fn notify_data_changed(&mut self) {
        self.listeners.notify(&WrapperEvent::DataChanged);
    }

    pub fn add(&mut self, parameters: &[String]) -> Result<(), WrapperError> {
        let mut args = vec!["add".to_owned()];
        args.extend(parameters.iter().cloned());
        self.run_interactive(&args)?;
        self.notify_data_changed();
        Ok(())
    }

    pub fn annotate(&mut self, id: u32, annotation: &[String]) -> Result<(), WrapperError> {
        let mut args = vec![id.to_string(), "annotate".to_owned()];
        args.extend(annotation.iter().cloned());
        self.run_interactive(&args)?;
        self.notify_data_changed();
        Ok(())
    }

    pub fn done(&mut self, ids: &[u32]) -> Result<(), WrapperError> {
        let mut args = id_args(ids);
        args.push("done".to_owned());
        self.run_interactive(&args)?;
        self.notify_data_changed();
        Ok(())
    }

    /// Show task details. Read-only: no data-changed event.
    pub fn view(&self, ids: &[u32]) -> Result<(), WrapperError> {
        self.run_interactive(&id_args(ids))
    }

    pub fn modify(&mut self, ids: &[u32], modifications: &[String]) -> Result<(), WrapperError> {
        let mut args = id_args(ids);
        args.push("mod".to_owned());
        args.extend(modifications.iter().cloned());
        self.run_interactive(&args)?;
        self.notify_data_changed();
        Ok(())
    }

    pub fn delete(&mut self, ids: &[u32]) -> Result<(), WrapperError> {
        let mut args = id_args(ids);
        args.push("del".to_owned());
        self.run_interactive(&args)?;
        self.notify_data_changed();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), WrapperError> {
        self.run_interactive(&["undo".to_owned()])?;
        self.notify_data_changed();
        Ok(())
    }

    pub fn sync(&mut self) -> Result<(), WrapperError> {
        self.run_interactive(&["sync".to_owned()])?;
        self.notify_data_changed();
        Ok(())
    }

    /// Publish data-changed without running anything; used when only the
    /// filter changed.
    pub fn invalidate_data(&mut self) {
        self.notify_data_changed();
    }
}

fn id_args(ids: &[u32]) -> Vec<String> {
    ids.iter().map(u32::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn load_args_force_plain_output_before_user_terms() {
        let filters = vec!["+home".to_owned(), "status:pending".to_owned()];
        let args = load_args(Some("next"), Some(&filters), Some("work"));
        assert_eq!(
            args,
            vec![
                "rc.defaultwidth:",
                "rc._forcecolor:off",
                "rc.color:off",
                "rc.context:work",
                "next",
                "+home",
                "status:pending",
            ]
        );
    }

    #[test]
    fn load_args_without_options_are_just_the_overrides() {
        assert_eq!(load_args(None, None, None), LOAD_OVERRIDES.to_vec());
    }

    #[test]
    fn invalidate_data_notifies_subscribers() {
        let mut wrapper = TaskWrapper::new(None);
        let fired = Rc::new(Cell::new(0));
        let sink = fired.clone();
        wrapper.register_listener(move |event| {
            assert_eq!(*event, WrapperEvent::DataChanged);
            sink.set(sink.get() + 1);
        });

        wrapper.invalidate_data();
        wrapper.invalidate_data();
        assert_eq!(fired.get(), 2);
    }
}
