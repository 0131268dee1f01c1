use crate::{Id, Table};
use serde::Serialize;
use std::fmt;

/// An entity kind stored in its own [`Table`].
///
/// Objects carry their own id; the table checks that the id returned by the
/// initializer passed to `create` is the one it allocated.
pub trait Object: Clone + fmt::Debug + Serialize + 'static {
    const SPACE_ID: u8;
    const TYPE_ID: u8;
    const TYPE_NAME: &'static str;

    fn id(&self) -> Id<Self>;

    /// Declares the secondary indices of this kind. Called once at registration.
    fn register_indices(_table: &mut Table<Self>) {}
}
