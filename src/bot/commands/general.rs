//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Ticket Desk Help**\n\
        Here is a summary of all available commands.\n\n\
        **Tickets**\n\
        • `/new [category] [topic]` - Opens a private support ticket.\n\
        • `/claim`, `/unclaim` - Takes or releases the current ticket (staff).\n\
        • `/transfer <member>` - Hands the ticket to another staff member (staff).\n\
        • `/lock`, `/unlock` - Stops or restores the creator's replies (staff).\n\
        • `/close [reason]` - Closes the ticket and deletes its channel (staff).\n\n\
        **Statistics**\n\
        • `/leaderboard [type] [range]` - Staff rankings (staff).\n\
        • `/stats` - Ticket statistics for this server.\n\
        • `/panel live|profiles|stop` - Auto-refreshing statistics panels.\n\n\
        **Staff**\n\
        • `/note <text>` - Adds a note to the ticket's private staff thread.\n\
        • `/stickynote <member> <note>`, `/viewnotes <member>` - Notes about members.\n\
        • `/setprofile`, `/viewprofile <member>`, `/profiles` - Staff profiles.\n\n\
        **Administration**\n\
        • `/category add|remove|list` - Ticket categories (Manage Server).\n\
        • `/settings show|footer|colour` - Embed appearance (Manage Server).\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
