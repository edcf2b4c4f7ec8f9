/// Upper bound on how much of an error body is kept for diagnostics.
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;
