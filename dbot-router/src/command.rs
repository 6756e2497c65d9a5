//! Command state machine of one session.
//!
//! A session is **idle** when no command is active, otherwise **active** with the command
//! name, a free-form stage and typed per-command arguments. Stage and arguments only exist
//! while a command is active; switching to a different command or going idle clears them.

use std::any::Any;
use std::fmt;

/// Outcome of a command handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdResult {
    /// The command is finished; the session goes back to idle.
    Processed,
    /// The command expects more input; the next plain-text message is routed back to it.
    WaitingForInput,
}

#[derive(Default)]
pub struct CommandState {
    command: String,
    stage: String,
    args: Option<Box<dyn Any + Send + Sync>>,
}

impl CommandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active command name; empty when idle.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_idle(&self) -> bool {
        self.command.is_empty()
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn set_stage(&mut self, stage: impl Into<String>) {
        self.stage = stage.into();
    }

    pub fn has_args(&self) -> bool {
        self.args.is_some()
    }

    /// Arguments of type `T`, if the active command stored some.
    pub fn args<T: Any>(&self) -> Option<&T> {
        self.args.as_ref().and_then(|a| a.downcast_ref::<T>())
    }

    /// Arguments of type `T`, created with `T::default()` when absent or of another type.
    pub fn args_mut<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        if !matches!(&self.args, Some(a) if a.is::<T>()) {
            self.args = Some(Box::new(T::default()));
        }
        match self.args.as_mut().and_then(|a| a.downcast_mut::<T>()) {
            Some(args) => args,
            None => unreachable!("args slot was just filled with the requested type"),
        }
    }

    /// Makes `command` the active command. A different command starts from an empty stage
    /// and no arguments; re-entering the active command keeps them. Returns true when the
    /// previous state was discarded.
    pub fn begin(&mut self, command: &str) -> bool {
        if self.command == command {
            return false;
        }
        self.command = command.to_string();
        self.stage.clear();
        self.args = None;
        true
    }

    /// Back to idle.
    pub fn reset(&mut self) {
        self.command.clear();
        self.stage.clear();
        self.args = None;
    }
}

impl fmt::Debug for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandState")
            .field("command", &self.command)
            .field("stage", &self.stage)
            .field("has_args", &self.has_args())
            .finish()
    }
}
