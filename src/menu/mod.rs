//! Menu identity: which of the two published menus a request is asking for.

use std::fmt;

/// The menu a client wants, selected by the `type` query parameter.
///
/// Anything that is not exactly `dinner` (including a missing parameter)
/// selects the lunch menu, so every request maps onto one of two cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Lunch,
    Dinner,
}

impl MenuKind {
    /// Maps the raw `type` query parameter onto a menu.
    pub fn from_type_param(value: Option<&str>) -> Self {
        match value {
            Some("dinner") => Self::Dinner,
            _ => Self::Lunch,
        }
    }

    /// Returns the lowercase wire name of this menu.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    /// Returns the cache key for this menu.
    ///
    /// The key is derived from the normalized request shape rather than the
    /// raw URL, so `/menu` and `/menu?type=lunch` share one entry.
    pub fn request_key(self) -> String {
        format!("GET:/menu?type={}", self.as_str())
    }
}

impl fmt::Display for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dinner_param_selects_dinner() {
        assert_eq!(MenuKind::from_type_param(Some("dinner")), MenuKind::Dinner);
    }

    #[test]
    fn missing_param_defaults_to_lunch() {
        assert_eq!(MenuKind::from_type_param(None), MenuKind::Lunch);
    }

    #[test]
    fn unknown_and_miscased_params_default_to_lunch() {
        assert_eq!(MenuKind::from_type_param(Some("brunch")), MenuKind::Lunch);
        assert_eq!(MenuKind::from_type_param(Some("DINNER")), MenuKind::Lunch);
        assert_eq!(MenuKind::from_type_param(Some("")), MenuKind::Lunch);
    }

    #[test]
    fn request_keys_are_distinct_per_menu() {
        assert_ne!(
            MenuKind::Lunch.request_key(),
            MenuKind::Dinner.request_key()
        );
    }

    #[test]
    fn equivalent_requests_share_a_key() {
        let implicit = MenuKind::from_type_param(None).request_key();
        let explicit = MenuKind::from_type_param(Some("lunch")).request_key();
        assert_eq!(implicit, explicit);
        assert_eq!(implicit, "GET:/menu?type=lunch");
    }
}
