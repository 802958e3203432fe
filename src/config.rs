//! Cursor configuration.

use crate::native::constants::{DEFAULT_STRING_SIZE, MAX_STRING_SIZE};

/// Default number of rows requested per native fetch.
pub const DEFAULT_ARRAYSIZE: usize = 100;

/// Settings applied to every cursor a connection creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorConfig {
    /// Rows requested per native fetch.
    pub arraysize: usize,
    /// Capacity of string and binary variables created with size 0.
    pub default_string_size: usize,
    /// Upper bound for resizable variables.
    pub max_string_size: usize,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            arraysize: DEFAULT_ARRAYSIZE,
            default_string_size: DEFAULT_STRING_SIZE,
            max_string_size: MAX_STRING_SIZE,
        }
    }
}

impl CursorConfig {
    /// Set the fetch batch size.
    ///
    /// A value of 0 is treated as 1.
    ///
    /// # Example
    ///
    /// ```
    /// use oracle_cursor::CursorConfig;
    ///
    /// let config = CursorConfig::default().with_arraysize(500);
    /// assert_eq!(config.arraysize, 500);
    /// ```
    pub fn with_arraysize(mut self, arraysize: usize) -> Self {
        self.arraysize = arraysize.max(1);
        self
    }

    /// Set the capacity used for typed string/binary variables of size 0.
    pub fn with_default_string_size(mut self, size: usize) -> Self {
        self.default_string_size = size;
        self
    }

    /// Set the growth ceiling for resizable variables.
    pub fn with_max_string_size(mut self, size: usize) -> Self {
        self.max_string_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CursorConfig::default();
        assert_eq!(config.arraysize, 100);
        assert_eq!(config.default_string_size, 4000);
        assert_eq!(config.max_string_size, 32767);
    }

    #[test]
    fn test_zero_arraysize_clamped() {
        assert_eq!(CursorConfig::default().with_arraysize(0).arraysize, 1);
    }
}
