use std::sync::Arc;

use super::error::require;
use super::{ServiceError, ServiceResult, Table};
use crate::api::{Backend, Query};
use crate::models::{Member, MemberFilter, MemberStats, MemberUpdate, NewMember};
use crate::utils::looks_like_email;

pub const MEMBERS_TABLE: &str = "members";

fn check_email(email: &str) -> ServiceResult<()> {
    require(email, "Email")?;
    if !looks_like_email(email) {
        return Err(ServiceError::Validation("Please enter a valid email address".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MemberService {
    members: Table,
}

impl MemberService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            members: Table::new(backend, MEMBERS_TABLE, "Member"),
        }
    }

    /// All members, newest first
    pub async fn list(&self) -> ServiceResult<Vec<Member>> {
        self.members.list(&Query::new().desc("created_at")).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Member> {
        self.members.get(id).await
    }

    pub async fn create(&self, member: &NewMember) -> ServiceResult<Member> {
        require(&member.full_name, "Full name")?;
        check_email(&member.email)?;
        self.members.insert(member).await
    }

    pub async fn update(&self, id: &str, update: &MemberUpdate) -> ServiceResult<Member> {
        if let Some(ref name) = update.full_name {
            require(name, "Full name")?;
        }
        if let Some(ref email) = update.email {
            check_email(email)?;
        }
        self.members.update(id, update).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.members.delete(id).await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> ServiceResult<Member> {
        self.members.set_flag(id, "is_active", active).await
    }

    pub async fn stats(&self) -> ServiceResult<MemberStats> {
        Ok(MemberStats::from_members(&self.list().await?))
    }

    pub async fn search(&self, filter: &MemberFilter) -> ServiceResult<Vec<Member>> {
        let members = self.list().await?;
        Ok(filter.apply(&members).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::models::{MembershipTier, StatusFilter};
    use chrono::NaiveDate;

    fn new_member(name: &str, tier: MembershipTier, active: bool) -> NewMember {
        NewMember {
            full_name: name.to_string(),
            email: format!("{}@example.com", name.split(' ').next().unwrap_or(name).to_lowercase()),
            membership_tier: tier,
            membership_start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            membership_end_date: None,
            is_active: active,
        }
    }

    fn service() -> MemberService {
        MemberService::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_create_validates() {
        let members = service();
        let mut bad = new_member("Luna Grey", MembershipTier::Vip, true);
        bad.email = "luna-at-example".to_string();
        assert!(members.create(&bad).await.unwrap_err().is_validation());

        bad.full_name = " ".to_string();
        assert_eq!(members.create(&bad).await.unwrap_err().to_string(), "Full name is required");
    }

    #[tokio::test]
    async fn test_set_active_only_changes_flag() {
        let members = service();
        let created = members
            .create(&new_member("Iris Vale", MembershipTier::CircleMember, true))
            .await
            .unwrap();

        let toggled = members.set_active(&created.id, false).await.unwrap();
        assert!(!toggled.is_active);
        assert_eq!(toggled.full_name, created.full_name);
        assert_eq!(toggled.email, created.email);
        assert_eq!(toggled.membership_tier, created.membership_tier);
        assert_eq!(toggled.membership_start_date, created.membership_start_date);
    }

    #[tokio::test]
    async fn test_stats_and_search() {
        let members = service();
        members.create(&new_member("Luna Grey", MembershipTier::Vip, true)).await.unwrap();
        members.create(&new_member("Iris Vale", MembershipTier::CircleMember, true)).await.unwrap();
        members.create(&new_member("Rowan Ash", MembershipTier::CircleMember, false)).await.unwrap();

        let stats = members.stats().await.unwrap();
        assert_eq!(stats, MemberStats { total: 3, active: 2, circle: 2, vip: 1 });

        let filter = MemberFilter {
            tier: Some(MembershipTier::CircleMember),
            status: StatusFilter::Active,
            search: "VALE".to_string(),
        };
        let found = members.search(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name, "Iris Vale");

        let none = MemberFilter {
            tier: Some(MembershipTier::Vip),
            status: StatusFilter::Inactive,
            ..Default::default()
        };
        assert!(members.search(&none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_member() {
        let members = service();
        assert!(members.delete("nope").await.unwrap_err().is_not_found());
    }
}
