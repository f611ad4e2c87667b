//! Plain-text formatting of server responses for the prompt.

use pickle_cup::auth::User;
use pickle_cup::bracket::{Matchup, render_bracket};
use pickle_cup::matches::MatchSummary;
use pickle_cup::player::{Player, PlayerSummary};
use pickle_cup::team::TeamSummary;
use pickle_cup::tournament::{BracketView, Tournament};

use crate::api_client::PlayerStatsView;

fn name_of(first: &str, last: Option<&str>) -> String {
    match last {
        Some(last) if !last.is_empty() => format!("{first} {last}"),
        _ => first.to_string(),
    }
}

pub fn player_list(players: &[PlayerSummary]) -> String {
    if players.is_empty() {
        return "No players found.".to_string();
    }
    players
        .iter()
        .map(|p| format!("{}  {}", p.id, name_of(&p.first_name, p.last_name.as_deref())))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn player(player: &Player) -> String {
    match &player.username {
        Some(username) => format!("{} (@{})  {}", player.full_name(), username, player.id),
        None => format!("{}  {}", player.full_name(), player.id),
    }
}

/// Record, win rate and frequent partners
pub fn player_stats(view: &PlayerStatsView) -> String {
    let mut lines = vec![
        name_of(&view.player.first_name, view.player.last_name.as_deref()),
        format!(
            "  Wins: {}  Losses: {}  Played: {}",
            view.stats.wins, view.stats.losses, view.games_played
        ),
        format!("  Win rate: {}", view.win_rate),
    ];

    if view.stats.common_teammates.is_empty() {
        lines.push("  No teammates yet".to_string());
    } else {
        lines.push("  Common teammates:".to_string());
        for mate in &view.stats.common_teammates {
            lines.push(format!(
                "    {} ({} games)",
                name_of(&mate.first_name, mate.last_name.as_deref()),
                mate.games_played_together
            ));
        }
    }
    lines.join("\n")
}

pub fn team_list(teams: &[TeamSummary]) -> String {
    if teams.is_empty() {
        return "You are not on any team yet.".to_string();
    }
    teams
        .iter()
        .map(|team| {
            format!(
                "{}  {} ({} & {})",
                team.id,
                team.name,
                team.player1_username.as_deref().unwrap_or("?"),
                team.player2_username.as_deref().unwrap_or("?")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn tournament_list(tournaments: &[Tournament]) -> String {
    if tournaments.is_empty() {
        return "No tournaments yet.".to_string();
    }
    tournaments
        .iter()
        .map(|t| {
            format!(
                "{}  {} [{}, {}]",
                t.id,
                t.name,
                t.structure.label(),
                t.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn match_list(matches: &[MatchSummary]) -> String {
    if matches.is_empty() {
        return "No matches yet.".to_string();
    }
    matches
        .iter()
        .map(|m| {
            let winner = match m.winner_team_id {
                Some(id) if id == m.team1.id => format!("  winner: {}", m.team1.name),
                Some(id) if id == m.team2.id => format!("  winner: {}", m.team2.name),
                _ => String::new(),
            };
            format!(
                "{}  {}  {} vs {}{}",
                m.id,
                m.date_label(),
                m.team1.name,
                m.team2.name,
                winner
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tournament header followed by its first-round bracket
pub fn bracket(view: &BracketView) -> String {
    let matchups: Vec<Matchup> = view
        .matches
        .iter()
        .map(|m| Matchup {
            team1: m.team1.clone(),
            team2: m.team2.clone(),
        })
        .collect();

    let body = if matchups.is_empty() {
        "No matches have been generated.".to_string()
    } else {
        render_bracket(&matchups)
    };
    format!("{} ({})\n\n{}", view.tournament.name, view.tournament.status, body)
}

pub fn signed_in(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("Signed in as {}", user.email),
        None => "Signed out".to_string(),
    }
}
