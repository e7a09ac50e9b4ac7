use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// A parsed command, ready to run against the store.
pub trait Executable {
    /// The name clients use to invoke the command, in uppercase.
    const NAME: &'static str;

    fn exec(self, store: &Store) -> Result<Frame, Error>;
}
