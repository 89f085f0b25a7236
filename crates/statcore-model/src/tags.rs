use serde::{Deserialize, Serialize};

/// Ordered severity: `None < Medium < High` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSeverity {
    #[default]
    None,
    Medium,
    High,
}

/// Combined cheating/sniping tag state for a player (§3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tags {
    pub cheating: TagSeverity,
    pub sniping: TagSeverity,
}

impl Tags {
    /// Combines two tag sets by taking the maximum severity per axis, the
    /// rule used when a player shows up under more than one tag report.
    pub fn combine(self, other: Tags) -> Tags {
        Tags {
            cheating: self.cheating.max(other.cheating),
            sniping: self.sniping.max(other.sniping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(TagSeverity::None < TagSeverity::Medium);
        assert!(TagSeverity::Medium < TagSeverity::High);
    }

    #[test]
    fn combine_takes_max_per_axis() {
        let a = Tags {
            cheating: TagSeverity::Medium,
            sniping: TagSeverity::None,
        };
        let b = Tags {
            cheating: TagSeverity::None,
            sniping: TagSeverity::High,
        };
        let combined = a.combine(b);
        assert_eq!(combined.cheating, TagSeverity::Medium);
        assert_eq!(combined.sniping, TagSeverity::High);
    }
}
