use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    CircleMember,
    Vip,
}

impl MembershipTier {
    pub const ALL: [MembershipTier; 2] = [MembershipTier::CircleMember, MembershipTier::Vip];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::CircleMember => "circle_member",
            MembershipTier::Vip => "vip",
        }
    }

    /// Price line shown next to the tier in forms and announcements.
    pub fn price_label(&self) -> &'static str {
        match self {
            MembershipTier::CircleMember => "$35/month",
            MembershipTier::Vip => "$547/6 months",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle_member" | "circle" | "circle member" => Some(MembershipTier::CircleMember),
            "vip" => Some(MembershipTier::Vip),
            _ => None,
        }
    }
}

impl std::fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipTier::CircleMember => write!(f, "Circle Member"),
            MembershipTier::Vip => write!(f, "VIP"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub membership_tier: MembershipTier,
    #[serde(default)]
    pub membership_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub membership_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }

    /// Renewal date for display, "N/A" when the membership is open-ended.
    pub fn renewal_display(&self) -> String {
        self.membership_end_date
            .map(|d| d.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMember {
    pub full_name: String,
    pub email: String,
    pub membership_tier: MembershipTier,
    pub membership_start_date: Option<NaiveDate>,
    pub membership_end_date: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_tier: Option<MembershipTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStats {
    pub total: usize,
    pub active: usize,
    pub circle: usize,
    pub vip: usize,
}

impl MemberStats {
    pub fn from_members(members: &[Member]) -> Self {
        Self {
            total: members.len(),
            active: members.iter().filter(|m| m.is_active).count(),
            circle: members
                .iter()
                .filter(|m| m.membership_tier == MembershipTier::CircleMember)
                .count(),
            vip: members
                .iter()
                .filter(|m| m.membership_tier == MembershipTier::Vip)
                .count(),
        }
    }
}

/// Active/inactive filter shared by the member and product lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches(&self, is_active: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => is_active,
            StatusFilter::Inactive => !is_active,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Inactive,
            StatusFilter::Inactive => StatusFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Inactive => "Inactive",
        }
    }
}

/// Member list filter. A member is shown only if every active predicate matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub tier: Option<MembershipTier>,
    pub status: StatusFilter,
    pub search: String,
}

impl MemberFilter {
    pub fn matches(&self, member: &Member) -> bool {
        let tier_match = self.tier.map_or(true, |t| member.membership_tier == t);
        let status_match = self.status.matches(member.is_active);
        let query = self.search.trim();
        let search_match = query.is_empty()
            || contains_ignore_case(&member.full_name, query)
            || contains_ignore_case(&member.email, query);
        tier_match && status_match && search_match
    }

    pub fn apply<'a>(&self, members: &'a [Member]) -> Vec<&'a Member> {
        members.iter().filter(|m| self.matches(m)).collect()
    }

    /// Cycle the tier predicate: all → circle → vip → all.
    pub fn cycle_tier(&mut self) {
        self.tier = match self.tier {
            None => Some(MembershipTier::CircleMember),
            Some(MembershipTier::CircleMember) => Some(MembershipTier::Vip),
            Some(MembershipTier::Vip) => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, email: &str, tier: MembershipTier, active: bool) -> Member {
        Member {
            id: name.to_lowercase(),
            full_name: name.to_string(),
            email: email.to_string(),
            membership_tier: tier,
            membership_start_date: None,
            membership_end_date: None,
            is_active: active,
            created_at: None,
            updated_at: None,
        }
    }

    fn roster() -> Vec<Member> {
        vec![
            member("Luna Grey", "luna@example.com", MembershipTier::Vip, true),
            member("Iris Vale", "iris@example.com", MembershipTier::CircleMember, true),
            member("Rowan Ash", "rowan@moon.net", MembershipTier::CircleMember, false),
            member("Sage Hollow", "sage@example.com", MembershipTier::Vip, false),
        ]
    }

    #[test]
    fn test_tier_serde_names() {
        assert_eq!(serde_json::to_value(MembershipTier::CircleMember).unwrap(), "circle_member");
        assert_eq!(serde_json::to_value(MembershipTier::Vip).unwrap(), "vip");
        assert_eq!(MembershipTier::parse("VIP"), Some(MembershipTier::Vip));
        assert_eq!(MembershipTier::parse("gold"), None);
    }

    #[test]
    fn test_stats_counts() {
        let stats = MemberStats::from_members(&roster());
        assert_eq!(stats, MemberStats { total: 4, active: 2, circle: 2, vip: 2 });
    }

    #[test]
    fn test_filter_is_intersection() {
        let members = roster();

        let all = MemberFilter::default();
        assert_eq!(all.apply(&members).len(), 4);

        let vip = MemberFilter { tier: Some(MembershipTier::Vip), ..Default::default() };
        assert_eq!(vip.apply(&members).len(), 2);

        let vip_active = MemberFilter {
            tier: Some(MembershipTier::Vip),
            status: StatusFilter::Active,
            ..Default::default()
        };
        let names: Vec<_> = vip_active.apply(&members).iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["Luna Grey"]);

        let search = MemberFilter {
            status: StatusFilter::Inactive,
            search: "EXAMPLE.com".to_string(),
            ..Default::default()
        };
        let names: Vec<_> = search.apply(&members).iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["Sage Hollow"]);

        let nothing = MemberFilter {
            tier: Some(MembershipTier::CircleMember),
            search: "luna".to_string(),
            ..Default::default()
        };
        assert!(nothing.apply(&members).is_empty());
    }

    #[test]
    fn test_cycle_tier() {
        let mut f = MemberFilter::default();
        f.cycle_tier();
        assert_eq!(f.tier, Some(MembershipTier::CircleMember));
        f.cycle_tier();
        assert_eq!(f.tier, Some(MembershipTier::Vip));
        f.cycle_tier();
        assert_eq!(f.tier, None);
    }
}
