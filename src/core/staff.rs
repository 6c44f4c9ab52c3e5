//! Who counts as staff, and how members are referenced in free text.

use crate::{
    core::category,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;

/// Inputs for the staff check of one guild.
#[derive(Debug, Clone, Default)]
pub struct StaffPolicy {
    /// Configured super user ids
    pub supers: Vec<String>,
    /// Role ids listed as staff by any category of the guild
    pub staff_role_ids: BTreeSet<String>,
}

impl StaffPolicy {
    /// Loads the staff roles of `guild_id` and pairs them with the super users.
    pub async fn load(db: &DatabaseConnection, guild_id: &str, supers: &[String]) -> Result<Self> {
        Ok(Self {
            supers: supers.to_vec(),
            staff_role_ids: staff_role_ids(db, guild_id).await?,
        })
    }

    /// A user is staff if they are a super user, can manage the guild, or hold
    /// a staff role.
    #[must_use]
    pub fn is_staff(&self, user_id: &str, role_ids: &[String], manage_guild: bool) -> bool {
        self.is_super(user_id)
            || manage_guild
            || role_ids.iter().any(|r| self.staff_role_ids.contains(r))
    }

    /// Whether `user_id` is a configured super user.
    #[must_use]
    pub fn is_super(&self, user_id: &str) -> bool {
        self.supers.iter().any(|s| s == user_id)
    }
}

/// Parses a category's `staff_roles` column. Garbage yields no roles.
#[must_use]
pub fn parse_staff_roles(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed staff role list {raw:?}: {e}");
        Vec::new()
    })
}

/// Union of the staff roles of every category in the guild.
pub async fn staff_role_ids(db: &DatabaseConnection, guild_id: &str) -> Result<BTreeSet<String>> {
    let categories = category::list_categories(db, guild_id).await?;
    Ok(categories
        .iter()
        .flat_map(|c| parse_staff_roles(&c.staff_roles))
        .collect())
}

/// A member reference typed by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberReference {
    /// A raw id or a `<@id>` / `<@!id>` mention
    Id(u64),
    /// Anything else, matched against usernames and display names
    Name(String),
}

/// Interprets free text as a member id, mention, or name.
#[must_use]
pub fn parse_member_reference(input: &str) -> MemberReference {
    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix("<@")
        .and_then(|s| s.strip_suffix('>'))
        .map(|s| s.trim_start_matches('!'))
        .unwrap_or(trimmed);

    match inner.parse::<u64>() {
        Ok(id) if id > 0 => MemberReference::Id(id),
        _ => MemberReference::Name(trimmed.to_string()),
    }
}

/// Picks the best match for `query` among `(id, username, display_name)`.
///
/// An exact, case-insensitive match on either name wins; otherwise the first
/// candidate whose names contain the query.
#[must_use]
pub fn best_name_match<'a, T>(query: &str, candidates: &'a [(T, String, String)]) -> Option<&'a T> {
    let query = query.to_lowercase();
    let exact = candidates.iter().find(|(_, user, display)| {
        user.to_lowercase() == query || display.to_lowercase() == query
    });
    exact
        .or_else(|| {
            candidates.iter().find(|(_, user, display)| {
                user.to_lowercase().contains(&query) || display.to_lowercase().contains(&query)
            })
        })
        .map(|(id, _, _)| id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn policy(roles: &[&str]) -> StaffPolicy {
        StaffPolicy {
            supers: vec!["1".to_string()],
            staff_role_ids: roles.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_staff_sources() {
        let p = policy(&["10"]);
        assert!(p.is_staff("1", &[], false));
        assert!(p.is_staff("2", &[], true));
        assert!(p.is_staff("2", &["9".to_string(), "10".to_string()], false));
        assert!(!p.is_staff("2", &["9".to_string()], false));
    }

    #[test]
    fn test_parse_staff_roles() {
        assert_eq!(parse_staff_roles(r#"["1","2"]"#), vec!["1", "2"]);
        assert!(parse_staff_roles("not json").is_empty());
    }

    #[test]
    fn test_parse_member_reference() {
        assert_eq!(parse_member_reference("123"), MemberReference::Id(123));
        assert_eq!(parse_member_reference("<@123>"), MemberReference::Id(123));
        assert_eq!(parse_member_reference(" <@!456> "), MemberReference::Id(456));
        assert_eq!(
            parse_member_reference("alice"),
            MemberReference::Name("alice".to_string())
        );
        assert_eq!(
            parse_member_reference("<@abc>"),
            MemberReference::Name("<@abc>".to_string())
        );
    }

    #[test]
    fn test_best_name_match_prefers_exact() {
        let candidates = vec![
            (1, "alicea".to_string(), "Al".to_string()),
            (2, "bob".to_string(), "Alice".to_string()),
        ];
        assert_eq!(best_name_match("alice", &candidates), Some(&2));
        assert_eq!(best_name_match("lic", &candidates), Some(&1));
        assert_eq!(best_name_match("zed", &candidates), None);
    }

    #[tokio::test]
    async fn test_staff_roles_from_all_categories() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_category(&db, "g1", "Support", &["10", "11"]).await?;
        create_custom_category(&db, "g1", "Appeals", &["11", "12"]).await?;
        create_custom_category(&db, "g2", "Other", &["99"]).await?;

        let roles = staff_role_ids(&db, "g1").await?;
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["10", "11", "12"]);

        let policy = StaffPolicy::load(&db, "g1", &[]).await?;
        assert!(policy.is_staff("5", &["12".to_string()], false));
        assert!(!policy.is_staff("5", &["99".to_string()], false));
        Ok(())
    }
}
