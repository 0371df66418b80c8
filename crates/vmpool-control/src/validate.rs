//! Value checks for pool changes.

use vmpool_store::PoolChange;

use crate::error::ChangeRejection;

/// Separator that a template path must contain.
pub const TEMPLATE_SEPARATOR: char = '/';

/// Returns `true` if `template` is an acceptable template path.
///
/// It must contain a separator but may not start or end with one.
#[must_use]
pub fn valid_template(template: &str) -> bool {
    template.contains(TEMPLATE_SEPARATOR)
        && !template.starts_with(TEMPLATE_SEPARATOR)
        && !template.ends_with(TEMPLATE_SEPARATOR)
}

/// Parse a pool size: base-10 digits only, within `u32`.
#[must_use]
pub fn parse_size(size: &str) -> Option<u32> {
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    size.parse().ok()
}

/// Which pool attribute a change-set targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// `POST /config/pooltemplate`.
    Template,
    /// `POST /config/poolsize`.
    Size,
}

impl ChangeKind {
    /// Validate a raw value for the entry `name`. A missing value (one that
    /// was not a string or integer) is a format rejection like any other.
    ///
    /// # Errors
    ///
    /// Returns the format rejection for this kind if the value is invalid.
    pub fn parse(
        self,
        name: &str,
        raw_value: Option<&str>,
    ) -> Result<PoolChange, ChangeRejection> {
        let change = match (self, raw_value) {
            (Self::Template, Some(template)) if valid_template(template) => {
                Some(PoolChange::Template(template.to_string()))
            }
            (Self::Size, Some(size)) => parse_size(size).map(PoolChange::Size),
            _ => None,
        };
        change.ok_or_else(|| self.rejection(name))
    }

    /// The format rejection for this kind.
    #[must_use]
    pub fn rejection(self, name: &str) -> ChangeRejection {
        match self {
            Self::Template => ChangeRejection::InvalidTemplateFormat(name.to_string()),
            Self::Size => ChangeRejection::InvalidSizeFormat(name.to_string()),
        }
    }

    /// Attribute name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Size => "size",
        }
    }
}
