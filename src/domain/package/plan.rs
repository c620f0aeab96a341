//! Plan categories.
//!
//! A package's plan category is derived from its duration and stored on the
//! member's membership for reporting.

use serde::{Deserialize, Serialize};

/// Membership plan category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Monthly,
    Quarterly,
    HalfYearly,
    Annual,
    /// Any duration without a named plan.
    Custom,
}

impl PlanCategory {
    /// Category for a package lasting `months` months.
    pub fn from_duration_months(months: u32) -> Self {
        match months {
            1 => PlanCategory::Monthly,
            3 => PlanCategory::Quarterly,
            6 => PlanCategory::HalfYearly,
            12 => PlanCategory::Annual,
            _ => PlanCategory::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanCategory::Monthly => "monthly",
            PlanCategory::Quarterly => "quarterly",
            PlanCategory::HalfYearly => "half_yearly",
            PlanCategory::Annual => "annual",
            PlanCategory::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(PlanCategory::Monthly),
            "quarterly" => Some(PlanCategory::Quarterly),
            "half_yearly" => Some(PlanCategory::HalfYearly),
            "annual" => Some(PlanCategory::Annual),
            "custom" => Some(PlanCategory::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
