use pickle_cup::matches::MatchId;
use pickle_cup::player::PlayerId;
use pickle_cup::team::TeamId;
use pickle_cup::tournament::TournamentId;
use std::fmt;
use uuid::Uuid;

/// Commands understood by the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Player(PlayerId),
    Stats(PlayerId),
    Teams,
    CreateTeam { partner: String, name: String },
    Preview(Vec<TeamId>),
    Tournaments,
    Bracket(TournamentId),
    CreateTournament { name: String, team_ids: Vec<TeamId> },
    Seed {
        tournament_id: TournamentId,
        team_ids: Vec<TeamId>,
    },
    Matches,
    Result { match_id: MatchId, winner: TeamId },
    WhoAmI,
    SignOut,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required argument was not given.
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },
    /// An argument that should be an ID is not a valid UUID.
    InvalidId(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { command, usage } => {
                write!(f, "'{}' needs more arguments (usage: {})", command, usage)
            }
            Self::InvalidId(value) => write!(f, "'{}' is not a valid ID", value),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP_TEXT: &str = "\
Commands:
  search QUERY                    Find players by name
  player PLAYER_ID                Show a player profile
  stats PLAYER_ID                 Show a player's record
  teams                           List your teams
  team PARTNER_USERNAME NAME      Create a team with a partner
  preview TEAM_ID...              Preview round 1 for teams in order
  tournaments                     List tournaments
  bracket TOURNAMENT_ID           Show a tournament's bracket
  create NAME [TEAM_ID...]        Create a tournament, optionally seeding round 1
  seed TOURNAMENT_ID TEAM_ID...   Seed round 1 of your tournament
  matches                         List recent matches
  result MATCH_ID WINNER_TEAM_ID  Record a match winner
  whoami                          Show who is signed in
  signout                         Sign out
  help                            Show this help
  quit                            Exit";

/// Parse one line of prompt input.
///
/// # Examples
///
/// ```
/// use pc_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("teams"), Ok(Command::Teams));
/// assert_eq!(
///     parse_command("search  ada love "),
///     Ok(Command::Search("ada love".to_string()))
/// );
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    match trimmed {
        "teams" => return Ok(Command::Teams),
        "tournaments" => return Ok(Command::Tournaments),
        "matches" => return Ok(Command::Matches),
        "whoami" => return Ok(Command::WhoAmI),
        "signout" => return Ok(Command::SignOut),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    let Some((&name, args)) = parts.split_first() else {
        return Err(ParseError::UnrecognizedCommand(String::new()));
    };

    match name {
        "search" => {
            require(args, 1, "search", "search QUERY")?;
            Ok(Command::Search(args.join(" ")))
        }
        "player" => {
            require(args, 1, "player", "player PLAYER_ID")?;
            Ok(Command::Player(parse_id(args[0])?))
        }
        "stats" => {
            require(args, 1, "stats", "stats PLAYER_ID")?;
            Ok(Command::Stats(parse_id(args[0])?))
        }
        "team" => {
            require(args, 2, "team", "team PARTNER_USERNAME NAME")?;
            Ok(Command::CreateTeam {
                partner: args[0].to_string(),
                name: args[1..].join(" "),
            })
        }
        "preview" => Ok(Command::Preview(parse_ids(args)?)),
        "bracket" => {
            require(args, 1, "bracket", "bracket TOURNAMENT_ID")?;
            Ok(Command::Bracket(parse_id(args[0])?))
        }
        "create" => parse_create_command(args),
        "seed" => {
            require(args, 1, "seed", "seed TOURNAMENT_ID TEAM_ID...")?;
            Ok(Command::Seed {
                tournament_id: parse_id(args[0])?,
                team_ids: parse_ids(&args[1..])?,
            })
        }
        "result" => {
            require(args, 2, "result", "result MATCH_ID WINNER_TEAM_ID")?;
            Ok(Command::Result {
                match_id: parse_id(args[0])?,
                winner: parse_id(args[1])?,
            })
        }
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// "create NAME [TEAM_ID...]": trailing IDs are the selection, the rest is the name
fn parse_create_command(args: &[&str]) -> Result<Command, ParseError> {
    let split = args
        .iter()
        .rposition(|arg| Uuid::parse_str(arg).is_err())
        .map_or(0, |last_word| last_word + 1);
    let (name, ids) = args.split_at(split);

    if name.is_empty() {
        return Err(ParseError::MissingArgument {
            command: "create",
            usage: "create NAME [TEAM_ID...]",
        });
    }

    Ok(Command::CreateTournament {
        name: name.join(" "),
        team_ids: parse_ids(ids)?,
    })
}

fn require(
    args: &[&str],
    count: usize,
    command: &'static str,
    usage: &'static str,
) -> Result<(), ParseError> {
    if args.len() < count {
        return Err(ParseError::MissingArgument { command, usage });
    }
    Ok(())
}

fn parse_id(value: &str) -> Result<Uuid, ParseError> {
    Uuid::parse_str(value).map_err(|_| ParseError::InvalidId(value.to_string()))
}

fn parse_ids(values: &[&str]) -> Result<Vec<Uuid>, ParseError> {
    values.iter().map(|value| parse_id(value)).collect()
}
