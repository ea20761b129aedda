//! Canonical schema constants for structured logging and events

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Pagination
pub const FIELD_FILTER: &str = "filter";
pub const FIELD_LIMIT: &str = "limit";
pub const FIELD_CURSOR: &str = "cursor";
pub const FIELD_NEXT_CURSOR: &str = "next_cursor";
pub const FIELD_ITEM_COUNT: &str = "item_count";
pub const FIELD_ITEM_ID: &str = "item_id";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
