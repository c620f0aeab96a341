//! Gateway status codes.

/// Outcome reported by the gateway in `status_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayStatus {
    /// `2`
    Success,
    /// `0`
    Pending,
    /// `-1`
    Cancelled,
    /// `-2`
    Failed,
    /// `-3`
    Chargeback,
    /// Any code the gateway does not document. Handled as a no-op.
    Unknown(i32),
}

impl GatewayStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => GatewayStatus::Success,
            0 => GatewayStatus::Pending,
            -1 => GatewayStatus::Cancelled,
            -2 => GatewayStatus::Failed,
            -3 => GatewayStatus::Chargeback,
            other => GatewayStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            GatewayStatus::Success => 2,
            GatewayStatus::Pending => 0,
            GatewayStatus::Cancelled => -1,
            GatewayStatus::Failed => -2,
            GatewayStatus::Chargeback => -3,
            GatewayStatus::Unknown(code) => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes_map_to_outcomes() {
        assert_eq!(GatewayStatus::from_code(2), GatewayStatus::Success);
        assert_eq!(GatewayStatus::from_code(0), GatewayStatus::Pending);
        assert_eq!(GatewayStatus::from_code(-1), GatewayStatus::Cancelled);
        assert_eq!(GatewayStatus::from_code(-2), GatewayStatus::Failed);
        assert_eq!(GatewayStatus::from_code(-3), GatewayStatus::Chargeback);
    }

    #[test]
    fn undocumented_codes_are_kept() {
        let status = GatewayStatus::from_code(7);
        assert_eq!(status, GatewayStatus::Unknown(7));
        assert_eq!(status.code(), 7);
    }
}
