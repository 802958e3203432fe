//! Connection: the source of cursors.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::CursorConfig;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::native::NativeSession;

/// An open native session and the settings for cursors created on it.
pub struct Connection {
    session: Arc<dyn NativeSession>,
    config: CursorConfig,
}

impl Connection {
    /// Wrap a session opened by the native layer.
    ///
    /// # Example
    ///
    /// ```
    /// use oracle_cursor::native::memory::MemoryClient;
    /// use oracle_cursor::{Connection, CursorConfig};
    /// use std::sync::Arc;
    ///
    /// let conn = Connection::open(Arc::new(MemoryClient::new()))
    ///     .with_config(CursorConfig::default().with_arraysize(50));
    /// assert!(conn.is_connected());
    /// assert_eq!(conn.new_cursor().arraysize(), 50);
    /// ```
    pub fn open(session: Arc<dyn NativeSession>) -> Self {
        Self {
            session,
            config: CursorConfig::default(),
        }
    }

    /// Set the configuration for cursors created from now on.
    pub fn with_config(mut self, config: CursorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// Create a cursor. No native handle is opened until its first execute.
    pub fn new_cursor(&self) -> Cursor {
        Cursor::new(Arc::clone(&self.session), self.config)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Log off. Cursors still holding handles fail on their next native call.
    pub fn close(&self) -> Result<()> {
        self.session.close()?;
        debug!("session closed");
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .field("config", &self.config)
            .finish()
    }
}
