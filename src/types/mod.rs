pub mod identifiers;

pub use identifiers::{ContentVersion, ItemId, ItemIdError};
