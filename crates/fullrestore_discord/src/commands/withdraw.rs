//! `/out`: self withdrawal in a tournament's sign-up channel.

use fullrestore_api::models::Pairing;
use serenity::client::Context;
use serenity::model::application::CommandInteraction;

use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::helpers;

pub async fn run(ctx: &Context, bot: &BotContext, cmd: &CommandInteraction) -> Result<()> {
    let tournament = match helpers::tournament_for_signup_channel(bot, cmd).await {
        Ok(tournament) => tournament,
        Err(DiscordError::NoTournament) => {
            return helpers::respond(ctx, cmd, "No tournament found in this channel.", true).await;
        }
        Err(err) => return Err(err),
    };

    let discord_id = cmd.user.id.to_string();
    let entrant = match bot.api.find_entrant(&tournament.slug, &discord_id).await {
        Ok(entrant) => entrant,
        Err(err) if err.is_not_found() => {
            return helpers::respond(ctx, cmd, "You're not signed up for this tournament.", true)
                .await;
        }
        Err(err) => return Err(err.into()),
    };

    let pairings = bot
        .api
        .list_pairings_for_player(&tournament.slug, &discord_id)
        .await?;
    if !may_withdraw(&pairings) {
        return helpers::respond(
            ctx,
            cmd,
            "This tournament has already begun, so you can't drop out this way. \
             Please contact a tournament admin.",
            true,
        )
        .await;
    }

    bot.api
        .delete_entrant(entrant.player.id, &tournament.slug)
        .await?;
    super::signup::revoke_tournament_role(ctx, bot, &tournament, cmd.user.id).await;

    helpers::respond(
        ctx,
        cmd,
        format!(
            "{} has withdrawn from {}.",
            helpers::mention(cmd.user.id.get()),
            tournament.name
        ),
        false,
    )
    .await
}

/// Self-withdrawal is only allowed before the player appears in the
/// bracket. Once they have a pairing, dropping out is an admin decision.
fn may_withdraw(pairings: &[Pairing]) -> bool {
    pairings.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fullrestore_api::models::{Entrant, Player};

    fn pairing() -> Pairing {
        let player = |id: i64| Player {
            id,
            ps_user: format!("player{id}"),
            discord_user: None,
            discord_id: Some(id.to_string()),
        };
        Pairing {
            id: 1,
            entrant1: Entrant { id: 1, player: player(1) },
            entrant2: Entrant { id: 2, player: player(2) },
            winner_id: None,
        }
    }

    #[test]
    fn withdrawal_is_blocked_once_paired() {
        assert!(may_withdraw(&[]));
        assert!(!may_withdraw(&[pairing()]));
    }
}
