use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque identifier the host assigns to a palette window.
///
/// Cloning is cheap; the string is shared.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(Arc<str>);

impl WindowId {
    pub fn new(id: impl AsRef<str>) -> WindowId { WindowId(Arc::from(id.as_ref())) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "WindowId({})", self.0) }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for WindowId {
    fn from(id: &str) -> Self { WindowId::new(id) }
}

impl From<String> for WindowId {
    fn from(id: String) -> Self { WindowId(Arc::from(id)) }
}

impl Borrow<str> for WindowId {
    fn borrow(&self) -> &str { &self.0 }
}
