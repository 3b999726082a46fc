//! Named commands and the table they are dispatched from.

use crate::command::DumpState;
use crate::error::{Error, Result};
use crate::host::Host;
use log::debug;

/// A command that can be invoked by name against a [`Host`].
pub trait HostCommand {
    fn name(&self) -> &'static str;

    fn usage(&self) -> &'static str;

    /// `arg` is the command line with the command name stripped.
    fn invoke(&self, host: &mut dyn Host, arg: &str) -> Result<()>;
}

#[derive(Default)]
pub struct CommandTable {
    commands: Vec<Box<dyn HostCommand>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// table with every built-in command registered.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(Box::new(DumpState));
        table
    }

    /// Register `command`, replacing any earlier command of the same name.
    pub fn register(&mut self, command: Box<dyn HostCommand>) {
        self.commands.retain(|c| c.name() != command.name());
        self.commands.push(command);
    }

    pub fn get(&self, name: &str) -> Option<&dyn HostCommand> {
        self.commands.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Run a full command line such as `dumpstate /tmp/out`.
    pub fn dispatch(&self, host: &mut dyn Host, line: &str) -> Result<()> {
        let line = line.trim_start();
        let (name, arg) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));

        let command = self
            .get(name)
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))?;

        debug!("dispatching {} with {:?}", name, arg);
        command.invoke(host, arg)
    }
}
