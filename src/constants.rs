// Headers
pub const AUTHORIZATION: &str = "Authorization";
pub const SESSION_HEADER: &str = "X-Session-ID";
pub const FORWARDED_FOR: &str = "X-Forwarded-For";
pub const REAL_IP: &str = "X-Real-IP";

// Messages
pub const MESSAGE_INVALID_TOKEN: &str = "Invalid token, please login again";
pub const MESSAGE_OK: &str = "success";

// Routes reachable without a bearer token
pub const IGNORE_ROUTES: [&str; 3] = ["/health", "/auth/login", "/admin/auth/login"];

// Token lifetimes, seconds
pub const ONE_DAY: usize = 60 * 60 * 24;
pub const ONE_WEEK: usize = ONE_DAY * 7;
pub const USER_TOKEN_TTL: usize = ONE_WEEK;
pub const ADMIN_TOKEN_TTL: usize = ONE_DAY;

pub const REFRESH_TOKEN_LEN: usize = 96;

/// Expiry horizon of a staged user-status change.
pub const STATUS_CHANGE_EXPIRE_HOURS: i64 = 24;

// Paging
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const AUDIT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

// Entity names written to the audit trail
pub const ENTITY_USER: &str = "user";
pub const ENTITY_ADMIN: &str = "admin";
pub const ENTITY_TRANSACTION: &str = "transaction";
pub const ENTITY_BANK_ACCOUNT: &str = "bank_account";
pub const ENTITY_PENDING_TRANSACTION: &str = "pending_transaction";
pub const ENTITY_PENDING_STATUS_CHANGE: &str = "pending_user_status_change";
pub const ENTITY_APPROVAL_THRESHOLD: &str = "approval_threshold";
pub const ENTITY_SESSION: &str = "device_session";
