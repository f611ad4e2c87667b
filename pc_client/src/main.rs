//! A command-line client for the Pickle Cup server.
//!
//! Signs in with a magic link, then reads commands from stdin until `quit`.

use anyhow::{Context, Result};
use pico_args::Arguments;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use pc_client::api_client::ApiClient;
use pc_client::commands::{Command, HELP_TEXT, parse_command};
use pc_client::display;

const HELP: &str = "\
Connect to a Pickle Cup server

USAGE:
  pc_client [OPTIONS]

OPTIONS:
  --server URL          Server URL  [default: http://localhost:8080]
  --email ADDRESS       Email address to send the sign-in link to
  --token TOKEN         Sign-in token from a link already received

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    email: Option<String>,
    token: Option<String>,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs
            .value_from_str("--server")
            .unwrap_or_else(|_| "http://localhost:8080".to_string()),
        email: pargs.opt_value_from_str("--email")?,
        token: pargs.opt_value_from_str("--token")?,
    };

    run(args).await
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let line = input.next_line().await.context("Failed to read input")?;
    Ok(line.map(|l| l.trim().to_string()))
}

async fn run(args: Args) -> Result<()> {
    let client = ApiClient::new(args.server_url);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // Report sign-in changes as they happen
    let mut session_rx = client.session().subscribe();
    tokio::spawn(async move {
        while session_rx.changed().await.is_ok() {
            let user = session_rx.borrow_and_update().as_ref().map(|s| s.user.clone());
            println!("[{}]", display::signed_in(user.as_ref()));
        }
    });

    let token = match args.token {
        Some(token) => token,
        None => {
            let email = match args.email {
                Some(email) => email,
                None => prompt(&mut input, "Email: ")
                    .await?
                    .context("No email given")?,
            };
            client.request_magic_link(&email).await?;
            println!("A sign-in link was sent to {email}.");
            prompt(&mut input, "Paste the token from the link: ")
                .await?
                .context("No token given")?
        }
    };

    let user = client
        .complete_sign_in(&token)
        .await
        .context("Failed to sign in")?;
    println!("Welcome, {}! Type 'help' for commands.", user.email);

    while let Some(line) = prompt(&mut input, "> ").await? {
        if line.is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        match execute(&client, command).await {
            Ok(output) if !output.is_empty() => println!("{output}"),
            Ok(_) => {}
            Err(e) => println!("Error: {e:#}"),
        }
    }

    if let Err(e) = client.sign_out().await {
        println!("Sign-out failed: {e:#}");
    }
    Ok(())
}

async fn execute(client: &ApiClient, command: Command) -> Result<String> {
    let output = match command {
        Command::Search(query) => display::player_list(&client.search_players(&query).await?),
        Command::Player(id) => display::player(&client.get_player(id).await?),
        Command::Stats(id) => display::player_stats(&client.player_stats(id).await?),
        Command::Teams => display::team_list(&client.my_teams().await?),
        Command::CreateTeam { partner, name } => {
            let team = client.create_team(&name, &partner).await?;
            format!("Created team {} ({})", team.name, team.id)
        }
        Command::Preview(team_ids) => client.preview_bracket(&team_ids).await?.rendered,
        Command::Tournaments => display::tournament_list(&client.list_tournaments().await?),
        Command::Bracket(id) => display::bracket(&client.get_bracket(id).await?),
        Command::CreateTournament { name, team_ids } => {
            let created = client
                .create_tournament(&name, Default::default(), &team_ids)
                .await?;
            format!(
                "Created tournament {} ({}) with {} matches",
                created.tournament.name, created.tournament.id, created.matches_created
            )
        }
        Command::Seed {
            tournament_id,
            team_ids,
        } => {
            let created = client.generate_bracket(tournament_id, &team_ids).await?;
            format!("Seeded {created} matches")
        }
        Command::Matches => display::match_list(&client.recent_matches().await?),
        Command::Result { match_id, winner } => {
            client.record_result(match_id, winner).await?;
            "Result recorded".to_string()
        }
        Command::WhoAmI => display::signed_in(Some(&client.current_user().await?)),
        Command::SignOut => {
            client.sign_out().await?;
            String::new()
        }
        Command::Help => HELP_TEXT.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}
