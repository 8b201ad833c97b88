use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::membership::MembershipStatus;

/// Billing-relevant part of a user's profile row.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub membership_status: MembershipStatus,
    pub membership_plan: Option<String>,
    pub membership_expires: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Pro with an expiry still in the future.
    pub fn has_pro_access(&self, now: DateTime<Utc>) -> bool {
        self.membership_status == MembershipStatus::Pro
            && self.membership_expires.map(|e| e > now).unwrap_or(false)
    }

    /// Status as the dashboard should see it: a Pro membership past its
    /// expiry reads as free.
    pub fn effective_status(&self, now: DateTime<Utc>) -> MembershipStatus {
        match self.membership_status {
            MembershipStatus::Pro if !self.has_pro_access(now) => MembershipStatus::Free,
            status => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(status: MembershipStatus, expires: Option<DateTime<Utc>>) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            email: None,
            membership_status: status,
            membership_plan: None,
            membership_expires: expires,
            updated_at: None,
        }
    }

    #[test]
    fn test_has_pro_access() {
        let now = Utc::now();
        assert!(profile(MembershipStatus::Pro, Some(now + Duration::days(1))).has_pro_access(now));
        assert!(!profile(MembershipStatus::Pro, Some(now - Duration::days(1))).has_pro_access(now));
        assert!(!profile(MembershipStatus::Pro, None).has_pro_access(now));
        assert!(!profile(MembershipStatus::Free, Some(now + Duration::days(1))).has_pro_access(now));
    }

    #[test]
    fn test_effective_status() {
        let now = Utc::now();
        let lapsed = profile(MembershipStatus::Pro, Some(now - Duration::days(1)));
        let paid = profile(MembershipStatus::Pro, Some(now + Duration::days(1)));
        let demo = profile(MembershipStatus::Demo, None);

        assert_eq!(lapsed.effective_status(now), MembershipStatus::Free);
        assert_eq!(paid.effective_status(now), MembershipStatus::Pro);
        assert_eq!(demo.effective_status(now), MembershipStatus::Demo);
    }
}
