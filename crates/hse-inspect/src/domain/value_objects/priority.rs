//! Priority scales
//!
//! Inspections and assignments use different top levels (`critical` versus
//! `urgent`); the mapping between them is fixed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl From<AssignmentPriority> for InspectionPriority {
    fn from(priority: AssignmentPriority) -> Self {
        match priority {
            AssignmentPriority::Low => Self::Low,
            AssignmentPriority::Medium => Self::Medium,
            AssignmentPriority::High => Self::High,
            AssignmentPriority::Urgent => Self::Critical,
        }
    }
}

impl fmt::Display for InspectionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl fmt::Display for AssignmentPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

impl FromStr for AssignmentPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgent_maps_to_critical() {
        let mapped = InspectionPriority::from(AssignmentPriority::Urgent);
        assert_eq!(mapped, InspectionPriority::Critical);
        assert_eq!(InspectionPriority::from(AssignmentPriority::Low), InspectionPriority::Low);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!("URGENT".parse::<AssignmentPriority>().unwrap(), AssignmentPriority::Urgent);
        assert!("asap".parse::<AssignmentPriority>().is_err());
    }
}
