//! HTTP API client for the Pickle Cup server.

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use pickle_cup::auth::{MagicLinkRequest, RefreshRequest, SessionTokens, User};
use pickle_cup::bracket::Matchup;
use pickle_cup::matches::{Match, MatchId, MatchSummary, RecordResultRequest};
use pickle_cup::player::{DEFAULT_MIN_QUERY_LEN, Player, PlayerId, PlayerSummary};
use pickle_cup::stats::PlayerStats;
use pickle_cup::team::{NewTeam, Team, TeamId, TeamSummary};
use pickle_cup::tournament::{
    BracketView, CreatedTournament, Tournament, TournamentId, TournamentStructure,
};

use crate::session::SessionCache;

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    reason: Option<String>,
}

/// Player stats as served by the stats endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerStatsView {
    pub player: PlayerSummary,
    pub stats: PlayerStats,
    pub games_played: u64,
    pub win_rate: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BracketPreview {
    pub matchups: Vec<Matchup>,
    pub rendered: String,
}

#[derive(Debug, Serialize)]
struct CreateTournamentRequest<'a> {
    name: &'a str,
    structure: TournamentStructure,
    team_ids: &'a [TeamId],
}

#[derive(Debug, Serialize)]
struct TeamSelection<'a> {
    team_ids: &'a [TeamId],
}

#[derive(Debug, Deserialize)]
struct BracketCreated {
    created: usize,
}

/// API client for communicating with the server
///
/// Bearer tokens come from the [`SessionCache`]; signing in or out through
/// the client updates it.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    session: SessionCache,
    min_query_len: usize,
}

impl ApiClient {
    /// Create a client that uses the process-wide session cache
    pub fn new(base_url: String) -> Self {
        Self::with_session(base_url, SessionCache::global().clone())
    }

    /// Create a client over a specific session cache
    pub fn with_session(base_url: String, session: SessionCache) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            session,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }

    /// Queries shorter than this are answered locally with no results
    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.session.access_token().context("Not signed in")?;
        Ok(request.bearer_auth(token))
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Ask the server to email a sign-in link
    pub async fn request_magic_link(&self, email: &str) -> Result<()> {
        let request = MagicLinkRequest {
            email: email.to_string(),
        };
        let response = self
            .client
            .post(self.url("/auth/magic-link"))
            .json(&request)
            .send()
            .await
            .context("Failed to send sign-in link request")?;
        expect_success(response, "Sign-in link request").await?;
        Ok(())
    }

    /// Exchange the emailed token for a session and cache it
    pub async fn complete_sign_in(&self, token: &str) -> Result<User> {
        let response = self
            .client
            .get(self.url("/auth/callback"))
            .query(&[("token", token)])
            .send()
            .await
            .context("Failed to send sign-in request")?;
        let session: SessionTokens = parse(response, "Sign-in").await?;
        let user = session.user.clone();
        self.session.sign_in(session);
        Ok(user)
    }

    /// Rotate the cached refresh token
    pub async fn refresh(&self) -> Result<()> {
        let refresh_token = self.session.refresh_token().context("Not signed in")?;
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .context("Failed to send refresh request")?;

        match parse::<SessionTokens>(response, "Token refresh").await {
            Ok(session) => {
                self.session.sign_in(session);
                Ok(())
            }
            Err(e) => {
                self.session.sign_out();
                Err(e)
            }
        }
    }

    /// End the server session and clear the cache
    ///
    /// The cache is cleared even if the server cannot be reached.
    pub async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session.sign_out() else {
            return Ok(());
        };
        let response = self
            .client
            .post(self.url("/auth/sign-out"))
            .json(&RefreshRequest {
                refresh_token: session.refresh_token,
            })
            .send()
            .await
            .context("Failed to send sign-out request")?;
        expect_success(response, "Sign-out").await?;
        Ok(())
    }

    /// The signed-in user as the server sees it
    pub async fn current_user(&self) -> Result<User> {
        let request = self.authorized(self.client.get(self.url("/auth/me")))?;
        let response = request.send().await.context("Failed to fetch current user")?;
        parse(response, "Current user").await
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Search players by name
    ///
    /// Queries shorter than the minimum return no results without a request.
    pub async fn search_players(&self, query: &str) -> Result<Vec<PlayerSummary>> {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .get(self.url("/players/search"))
            .query(&[("q", query)])
            .send()
            .await
            .context("Failed to search players")?;
        parse(response, "Player search").await
    }

    pub async fn get_player(&self, player_id: PlayerId) -> Result<Player> {
        let response = self
            .client
            .get(self.url(&format!("/players/{player_id}")))
            .send()
            .await
            .context("Failed to fetch player")?;
        parse(response, "Player lookup").await
    }

    pub async fn player_stats(&self, player_id: PlayerId) -> Result<PlayerStatsView> {
        let response = self
            .client
            .get(self.url(&format!("/players/{player_id}/stats")))
            .send()
            .await
            .context("Failed to fetch player stats")?;
        parse(response, "Player stats").await
    }

    // ------------------------------------------------------------------
    // Teams and brackets
    // ------------------------------------------------------------------

    pub async fn my_teams(&self) -> Result<Vec<TeamSummary>> {
        let request = self.authorized(self.client.get(self.url("/teams")))?;
        let response = request.send().await.context("Failed to list teams")?;
        parse(response, "Team listing").await
    }

    pub async fn create_team(&self, name: &str, partner_username: &str) -> Result<Team> {
        let request = NewTeam {
            name: name.to_string(),
            partner_username: partner_username.to_string(),
        };
        let builder = self.authorized(self.client.post(self.url("/teams")))?;
        let response = builder
            .json(&request)
            .send()
            .await
            .context("Failed to send team request")?;
        parse(response, "Team creation").await
    }

    pub async fn preview_bracket(&self, team_ids: &[TeamId]) -> Result<BracketPreview> {
        let response = self
            .client
            .post(self.url("/brackets/preview"))
            .json(&TeamSelection { team_ids })
            .send()
            .await
            .context("Failed to send bracket preview request")?;
        parse(response, "Bracket preview").await
    }

    // ------------------------------------------------------------------
    // Tournaments and matches
    // ------------------------------------------------------------------

    pub async fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        let response = self
            .client
            .get(self.url("/tournaments"))
            .send()
            .await
            .context("Failed to list tournaments")?;
        parse(response, "Tournament listing").await
    }

    /// Create a tournament; a non-empty `team_ids` also seeds round 1
    pub async fn create_tournament(
        &self,
        name: &str,
        structure: TournamentStructure,
        team_ids: &[TeamId],
    ) -> Result<CreatedTournament> {
        let request = CreateTournamentRequest {
            name,
            structure,
            team_ids,
        };
        let builder = self.authorized(self.client.post(self.url("/tournaments")))?;
        let response = builder
            .json(&request)
            .send()
            .await
            .context("Failed to send tournament request")?;
        parse(response, "Tournament creation").await
    }

    pub async fn get_bracket(&self, tournament_id: TournamentId) -> Result<BracketView> {
        let response = self
            .client
            .get(self.url(&format!("/tournaments/{tournament_id}/bracket")))
            .send()
            .await
            .context("Failed to fetch bracket")?;
        parse(response, "Bracket lookup").await
    }

    /// Seed round 1 of an existing tournament, returning the number of matches
    pub async fn generate_bracket(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> Result<usize> {
        let url = self.url(&format!("/tournaments/{tournament_id}/bracket"));
        let builder = self.authorized(self.client.post(url))?;
        let response = builder
            .json(&TeamSelection { team_ids })
            .send()
            .await
            .context("Failed to send bracket request")?;
        let created: BracketCreated = parse(response, "Bracket generation").await?;
        Ok(created.created)
    }

    pub async fn recent_matches(&self) -> Result<Vec<MatchSummary>> {
        let request = self.authorized(self.client.get(self.url("/matches")))?;
        let response = request.send().await.context("Failed to list matches")?;
        parse(response, "Match listing").await
    }

    pub async fn record_result(&self, match_id: MatchId, winner_team_id: TeamId) -> Result<Match> {
        let url = self.url(&format!("/matches/{match_id}/result"));
        let builder = self.authorized(self.client.post(url))?;
        let response = builder
            .json(&RecordResultRequest { winner_team_id })
            .send()
            .await
            .context("Failed to send result")?;
        parse(response, "Result recording").await
    }
}

/// Fail with the server's error message unless the status is 2xx
async fn expect_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
    anyhow::bail!("{} failed ({}): {}", what, status_label(status), describe(&body));
}

async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let response = expect_success(response, what).await?;
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", what.to_lowercase()))
}

fn status_label(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Server error message with its reason code, or the raw body
fn describe(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            reason: Some(reason),
        }) => format!("{error} [{reason}]"),
        Ok(ErrorBody { error, reason: None }) => error,
        Err(_) => body.to_string(),
    }
}
