//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::category, errors::Error};

/// Suggests ticket category names of the current guild.
///
/// Matches anywhere in the name, ignoring case, and returns at most 25 names
/// (the Discord limit) sorted alphabetically.
pub async fn autocomplete_category_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Some(guild_id) = ctx.guild_id() else {
        return Vec::new();
    };
    let Ok(categories) =
        category::list_categories(&ctx.data().database, &guild_id.to_string()).await
    else {
        return Vec::new();
    };

    let mut matching = filter_names(categories.into_iter().map(|c| c.name), partial);
    matching.sort();
    matching
}

fn filter_names(names: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    names
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(25)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_names_ignores_case() {
        let names = ["Support", "Billing", "Reports"].map(String::from);
        assert_eq!(
            filter_names(names.clone().into_iter(), "PORT"),
            vec!["Support".to_string(), "Reports".to_string()]
        );
        assert_eq!(filter_names(names.into_iter(), "").len(), 3);
    }
}
