//! Scheduling thread management.

use serenity::builder::{CreateMessage, CreateThread};
use serenity::client::Context;
use serenity::model::channel::GuildChannel;
use serenity::model::id::{ChannelId, RoleId, UserId};
use serenity::model::user::User;

use crate::context::BotContext;
use crate::error::Result;
use crate::helpers;

/// Create a scheduling thread for one pairing: grant both players the pool
/// role, open a thread under the pool channel, and post the kickoff
/// message. If the thread cannot be created the role grants are rolled
/// back so the pool role keeps tracking actual pairings.
pub async fn create_pairing_thread(
    ctx: &Context,
    bot: &BotContext,
    pool: ChannelId,
    left: &User,
    right: &User,
    pool_role: RoleId,
    moderator: UserId,
    deadline: &str,
) -> Result<GuildChannel> {
    let guild = bot.config.guild_id;
    ctx.http
        .add_member_role(guild, left.id, pool_role, Some("tournament pairing"))
        .await?;
    ctx.http
        .add_member_role(guild, right.id, pool_role, Some("tournament pairing"))
        .await?;

    let name = helpers::thread_name(&left.name, &right.name);
    let thread = match pool.create_thread(&ctx.http, CreateThread::new(name)).await {
        Ok(thread) => thread,
        Err(err) => {
            tracing::warn!(%err, "thread creation failed, rolling back pool role grants");
            ctx.http
                .remove_member_role(guild, left.id, pool_role, Some("pairing thread failed"))
                .await
                .ok();
            ctx.http
                .remove_member_role(guild, right.id, pool_role, Some("pairing thread failed"))
                .await
                .ok();
            return Err(err.into());
        }
    };

    thread
        .id
        .send_message(
            &ctx.http,
            CreateMessage::new().content(kickoff_message(
                left.id.get(),
                right.id.get(),
                moderator.get(),
                deadline,
            )),
        )
        .await?;

    Ok(thread)
}

/// Opening post for a scheduling thread.
pub fn kickoff_message(left: u64, right: u64, moderator: u64, deadline: &str) -> String {
    format!(
        "{} vs. {}\n\n\
         Please schedule in this thread. Your pool moderator is {}, please upload all replays in this thread.\n\
         The round ends {deadline}, all games must be played by then. Good luck and have fun!",
        helpers::mention(left),
        helpers::mention(right),
        helpers::mention(moderator),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kickoff_message_names_everyone_and_the_deadline() {
        let message = kickoff_message(1, 2, 3, "<t:1735689600:F>");
        assert!(message.starts_with("<@1> vs. <@2>"));
        assert!(message.contains("<@3>"));
        assert!(message.contains("<t:1735689600:F>"));
    }
}
