//! Privilege hint

use netfind_core::Result;
use netfind_core::traits::PrivilegeCheck;

/// PrivilegeCheck that reports whether the effective user is root
#[derive(Debug, Clone, Copy, Default)]
pub struct RootPrivilegeCheck;

#[async_trait::async_trait]
impl PrivilegeCheck for RootPrivilegeCheck {
    async fn is_privileged(&self) -> Result<bool> {
        Ok(is_root::is_root())
    }
}
