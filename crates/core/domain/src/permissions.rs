//! 角色与授权判定。
//!
//! HTTP 层在进入核心逻辑前调用 [`authorize`]，核心模块本身不感知角色。

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// 仅管理员。
pub const ADMIN_ONLY: &[&str] = &[ROLE_ADMIN];
/// 管理员与普通操作员。
pub const OPERATORS: &[&str] = &[ROLE_ADMIN, ROLE_USER];
/// 任意已登录用户。
pub const ANY_ROLE: &[&str] = &[];

/// 授权结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// 判断持有的角色是否满足要求；`required` 为空表示不限角色。
pub fn authorize(roles: &[String], required: &[&str]) -> Access {
    if required.is_empty() {
        return Access::Allow;
    }
    if roles
        .iter()
        .any(|role| required.iter().any(|item| role == item))
    {
        Access::Allow
    } else {
        Access::Deny
    }
}
