//! Boot/reset banner detection
//!
//! GRBL prints `Grbl 1.1h ['$' for help]` whenever it boots, which also
//! happens on reset and emergency stop. Seeing it in place of an
//! acknowledgement means everything queued on the controller is gone.

/// Signature of the controller's boot banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetBanner {
    /// Identification substring
    pub id: String,
    /// Help-hint substring
    pub help: String,
}

impl Default for ResetBanner {
    fn default() -> Self {
        Self::new("Grbl", "for help")
    }
}

impl ResetBanner {
    /// Create a signature from its two substrings
    pub fn new(id: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            help: help.into(),
        }
    }

    /// True when `text` contains both substrings (case-sensitive)
    pub fn matches(&self, text: &str) -> bool {
        text.contains(&self.id) && text.contains(&self.help)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_grbl_banner() {
        let banner = ResetBanner::default();
        assert!(banner.matches("Grbl 1.1h ['$' for help]"));
        assert!(banner.matches("ok\nGrbl 0.9j ['$' for help]"));
    }

    #[test]
    fn test_requires_both_substrings() {
        let banner = ResetBanner::default();
        assert!(!banner.matches("ok"));
        assert!(!banner.matches("[VER:1.1h.20190825:Grbl]"));
        assert!(!banner.matches("type $ for help"));
        assert!(!banner.matches("grbl 1.1h ['$' for help]"));
    }

    #[test]
    fn test_custom_signature() {
        let banner = ResetBanner::new("FluidNC", "'$' for help");
        assert!(banner.matches("Grbl 3.7 [FluidNC v3.7.8 (wifi) '$' for help]"));
        assert!(!banner.matches("Grbl 1.1h ['$' for help]"));
    }
}
