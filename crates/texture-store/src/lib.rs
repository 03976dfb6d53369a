//! Filesystem-backed texture stores
//!
//! Maps an (asset kind, identity key) pair to a `<key>.png` file inside a
//! per-kind directory. [`AssetStore`] is the writable cache that gets wiped
//! periodically; [`OverrideStore`] is the operator-managed directory that the
//! server only ever reads.

mod error;
mod key;
mod kind;
mod store;

pub use error::{Result, StoreError};
pub use key::{IdentityKey, MAX_KEY_LEN};
pub use kind::{AssetKind, PerKind};
pub use store::{AssetStore, OverrideStore};
