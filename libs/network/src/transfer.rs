//! Student code upload and download
//!
//! Moving code to and from the robot is a separate channel from the realtime
//! session: unary async operations over a secure file copy with password
//! authentication, with their own error type. Only the contract lives here;
//! implementations plug in behind [`CodeTransfer`].

use std::path::Path;

use async_trait::async_trait;

use crate::error::TransferError;

/// Default SSH port on the robot
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Where student code lives on the robot and how to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Remote path of the student code file
    pub remote_code_path: String,
}

impl TransferTarget {
    /// `user@host:port` form for logs; never includes the password
    pub fn describe(&self, host: &str) -> String {
        format!("{}@{}:{}", self.user, host, self.port)
    }
}

/// Upload and download of the robot's student code file
#[async_trait]
pub trait CodeTransfer: Send + Sync {
    /// Copy a local file over the robot's student code
    async fn upload(&self, local_path: &Path, host: &str) -> Result<(), TransferError>;

    /// Fetch the robot's student code as text
    async fn download(&self, host: &str) -> Result<String, TransferError>;
}
