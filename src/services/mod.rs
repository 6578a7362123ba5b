pub mod audit_service;
pub mod auth_service;
pub mod category_service;
pub mod dashboard_service;
pub mod media_service;
pub mod order_service;
pub mod plan_service;
pub mod product_service;
pub mod settings_service;
pub mod usage_service;
pub mod user_service;

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};

/// Trimmed text, or `None` when nothing is left.
pub(crate) fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `lower(col) = lower(value)`.
pub(crate) fn lower_eq(col: impl IntoColumnRef, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).eq(value.to_lowercase())
}

/// `%value%` with LIKE metacharacters escaped.
pub(crate) fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_none() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" Mugs "), Some("Mugs".to_string()));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
