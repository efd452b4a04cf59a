use std::fmt;
use zeroize::Zeroizing;

/// A password or seed buffer whose contents are wiped on every exit path,
/// normal or early, before the memory is released.
#[derive(Clone, Default)]
pub struct SecString {
    bytes: Zeroizing<Vec<u8>>,
}

impl SecString {
    pub fn new(bytes: Vec<u8>) -> Self {
        SecString { bytes: Zeroizing::new(bytes) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Replace the contents, wiping the previous buffer.
    pub fn assign(&mut self, bytes: &[u8]) {
        self.bytes = Zeroizing::new(bytes.to_vec());
    }
}

impl From<&str> for SecString {
    fn from(value: &str) -> Self {
        SecString::new(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for SecString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecString(<{} bytes>)", self.bytes.len())
    }
}
