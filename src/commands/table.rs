use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::commands::executable::Executable;
use crate::commands::get::Get;
use crate::commands::hget::Hget;
use crate::commands::hset::Hset;
use crate::commands::ping::Ping;
use crate::commands::set::Set;
use crate::commands::{CommandParser, CommandParserError, Request};
use crate::frame::Frame;
use crate::store::Store;

/// Runs one command. Failures are reported to the client as error frames, never as a Rust error,
/// so a bad command can't take the connection down.
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, args: Vec<Frame>, store: &Store) -> Frame;
}

/// Adapts any command that can be parsed from its arguments and then executed into a [`Handler`].
pub struct CommandHandler<C> {
    _command: PhantomData<fn() -> C>,
}

impl<C> CommandHandler<C> {
    pub fn new() -> Self {
        Self {
            _command: PhantomData,
        }
    }
}

impl<C> Default for CommandHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Handler for CommandHandler<C>
where
    C: Executable + for<'a> TryFrom<&'a mut CommandParser, Error = CommandParserError>,
{
    fn name(&self) -> &str {
        C::NAME
    }

    fn execute(&self, args: Vec<Frame>, store: &Store) -> Frame {
        let parser = &mut CommandParser::new(args);

        let cmd = match C::try_from(parser) {
            Ok(cmd) => cmd,
            Err(CommandParserError::EndOfStream) => {
                return Frame::Error(format!(
                    "ERR wrong number of arguments for '{}' command",
                    C::NAME.to_lowercase()
                ))
            }
            Err(err) => return Frame::Error(format!("ERR {}", err)),
        };

        cmd.exec(store)
            .unwrap_or_else(|err| Frame::Error(format!("ERR {}", err)))
    }
}

/// Maps uppercase command names to their handlers.
#[derive(Clone)]
pub struct CommandTable {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl CommandTable {
    /// A table without any command.
    pub fn empty() -> CommandTable {
        CommandTable {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.insert(handler.name().to_uppercase(), handler);
    }

    pub fn add<C>(&mut self)
    where
        C: Executable
            + for<'a> TryFrom<&'a mut CommandParser, Error = CommandParserError>
            + 'static,
    {
        self.register(Arc::new(CommandHandler::<C>::new()));
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(&name.to_uppercase())
    }

    /// Runs `request` against the store. Unknown commands get an empty simple string back.
    pub fn dispatch(&self, request: Request, store: &Store) -> Frame {
        match self.lookup(&request.name) {
            Some(handler) => handler.execute(request.args, store),
            None => {
                debug!("Unknown command: {}", request.name);
                Frame::Simple(String::new())
            }
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.add::<Ping>();
        // string commands
        table.add::<Set>();
        table.add::<Get>();
        // hash commands
        table.add::<Hset>();
        table.add::<Hget>();
        table
    }
}
