//! Slash command definitions registered with the guild.

use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;
use serenity::model::channel::ChannelType;
use serenity::model::permissions::Permissions;

/// Create all slash commands for registration.
pub fn create_commands() -> Vec<CreateCommand> {
    vec![
        in_command(),
        out_command(),
        player_command(),
        round_command(),
        pairing_command(),
        match_command(),
        tournament_command(),
    ]
}

fn in_command() -> CreateCommand {
    CreateCommand::new("in")
        .description("Sign up for the tournament in this channel")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "ps_username",
                "Your Pokemon Showdown username",
            )
            .required(true),
        )
}

fn out_command() -> CreateCommand {
    CreateCommand::new("out").description("Cancel your sign-up")
}

fn player_command() -> CreateCommand {
    CreateCommand::new("player")
        .description("Commands for handling players.")
        .default_member_permissions(Permissions::BAN_MEMBERS)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "signup",
                "Adds a player to the tournament hosted in this channel.",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Player to sign-up")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "ps_username",
                    "Player's Pokemon Showdown username.",
                )
                .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "remove",
                "Removes a signed-up player from this tournament.",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Player to remove")
                    .required(true),
            ),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "list",
            "List of all players signed up for this tournament.",
        ))
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "add-bye",
                "Award proxy win to a player who doesn't have an opponent",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::Integer, "round", "Round to award bye on")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Player to award bye")
                    .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "remove-bye",
                "Remove bye / proxy win from player, if they have one",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::Integer, "round", "Round to remove bye on")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Player to remove bye")
                    .required(true),
            ),
        )
}

fn round_command() -> CreateCommand {
    CreateCommand::new("round")
        .description("Commands for handling pools.")
        .default_member_permissions(Permissions::BAN_MEMBERS)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "pair",
                "Assigns roles and pairs left users with right users.",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::Channel, "pool", "Which pool to handle")
                    .channel_types(vec![ChannelType::Text])
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role",
                    "Corresponding role for the pool being filled",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "moderator", "Moderator of this pool")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "deadline",
                    "Deadline for this round. Provide a Unix timestamp!",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "left",
                    "Players on the left-hand side of the pool, space-separated",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "right",
                    "Players on the right-hand side of the pool, space-separated",
                )
                .required(true),
            )
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "header",
                "Optional header message for any freeform text to be sent before threads are posted",
            )),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "init",
                "Creates a new round in the db & on the website.",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::Integer, "number", "Round number")
                    .required(true),
            )
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "deadline",
                "End date-time of this round. Please enter in YYYY-MM-DD",
            )),
        )
}

fn pairing_command() -> CreateCommand {
    CreateCommand::new("pairing")
        .description("Commands for modifying pairings.")
        .default_member_permissions(Permissions::BAN_MEMBERS)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "create",
                "Create a new pairing. Run in admin channel.",
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "round",
                    "Round number for this pairing",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "player1", "Left-side player")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "player2", "Right-side player")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "pool",
                    "Which pool to create scheduling thread",
                )
                .channel_types(vec![ChannelType::Text])
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role",
                    "Corresponding role for the pool being filled",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "moderator", "Moderator of this pool")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "deadline",
                    "Deadline for this round. Provide a Unix timestamp!",
                )
                .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "delete",
                "Deletes a pairing. Run in admin channel.",
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "round",
                    "Round number for this pairing",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "player1", "Left-side player")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "player2", "Right-side player")
                    .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "substitute",
                "Change players in a pairing thread. Run in corresponding thread.",
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "round",
                    "Round which this pairing is in",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "old_player", "Player to be subbed out")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::User,
                    "new_player",
                    "Player to be subbed in to this pairing",
                )
                .required(true),
            ),
        )
}

fn match_command() -> CreateCommand {
    let report = {
        let mut option = CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "report",
            "Record the winner and loser, and replay(s) of a pairing.",
        )
        .add_sub_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "round",
                "Round number for this pairing",
            )
            .required(true),
        )
        .add_sub_option(
            CreateCommandOption::new(CommandOptionType::User, "winner", "Player who won the match")
                .required(true),
        )
        // technically redundant but helps reduce human error
        .add_sub_option(
            CreateCommandOption::new(CommandOptionType::User, "loser", "Player who lost the match")
                .required(true),
        )
        .add_sub_option(
            CreateCommandOption::new(CommandOptionType::String, "replay1", "Game 1 replay URL")
                .required(true),
        );
        for game in 2..=5 {
            option = option.add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                format!("replay{game}"),
                format!("Game {game} replay URL"),
            ));
        }
        option
    };

    CreateCommand::new("match")
        .description("Commands for handling pairings and results.")
        .default_member_permissions(Permissions::BAN_MEMBERS)
        .add_option(report)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "activity",
                "Record the winner and loser of a pairing, no replays.",
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "round",
                    "Round number for this pairing",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "winner", "Player who won the match")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "loser", "Player who lost the match")
                    .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "undo",
                "Undo a match report (used for adjusting input mistakes).",
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "round",
                    "Round number for this pairing",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "winner", "Player who won the match")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "loser", "Player who lost the match")
                    .required(true),
            ),
        )
}

fn tournament_command() -> CreateCommand {
    CreateCommand::new("tournament")
        .description("Commands for interacting with tournament data.")
        .default_member_permissions(Permissions::BAN_MEMBERS)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "init",
                "Creates a new tournament.",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "name", "Name of the tournament")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "format",
                    "Tournament format, e.g. gen3ou",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "season",
                    "Season number of this tournament",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "best-of",
                    "Expected number of matches in a full set, e.g. best of 5 = first to 3 wins",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "elimination",
                    "Number of losses required to be eliminated",
                )
                .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "start-date",
                    "Start date of the tournament",
                )
                .required(true),
            )
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "finish-date",
                "Finish date of the tournament",
            ))
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "signup-start-date",
                "Start date for sign-ups",
            ))
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "signup-finish-date",
                "Finish date for sign-ups",
            ))
            .add_sub_option(CreateCommandOption::new(
                CommandOptionType::String,
                "info",
                "Freeform text for a description of tournament",
            )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_registered() {
        let commands = create_commands();
        assert_eq!(commands.len(), 7);
    }
}
