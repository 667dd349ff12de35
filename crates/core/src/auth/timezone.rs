use chrono_tz::Tz;

use crate::constants::DEFAULT_TIMEZONE;
use crate::errors::{Error, Result};

/// Resolves an IANA timezone name, falling back to the default when blank.
pub fn resolve_timezone(name: Option<&str>) -> Result<Tz> {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_TIMEZONE);
    name.parse::<Tz>()
        .map_err(|_| Error::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_falls_back_to_default() {
        assert_eq!(resolve_timezone(None).unwrap(), chrono_tz::Asia::Ho_Chi_Minh);
        assert_eq!(resolve_timezone(Some("  ")).unwrap(), chrono_tz::Asia::Ho_Chi_Minh);
    }

    #[test]
    fn known_and_unknown_names() {
        assert_eq!(resolve_timezone(Some("Europe/Paris")).unwrap(), chrono_tz::Europe::Paris);
        assert!(matches!(
            resolve_timezone(Some("Mars/Olympus")),
            Err(Error::InvalidTimezone(name)) if name == "Mars/Olympus"
        ));
    }
}
