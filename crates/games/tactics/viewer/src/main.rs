//! Tactics Viewer - command-line front end for the match-viewer client.
//!
//! Lists and manages lobby games, follows a match's live feed, and renders
//! maps and unit sprites to PNG files.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tactics_types::{GameMode, Match};
use tactics_viewer::assets::{resolve_shadow, resolve_sprite, AssetFetcher, LocalAssets};
use tactics_viewer::config::ViewerConfig;
use tactics_viewer::networking::{Api, HttpClient, MatchSync};
use tactics_viewer::rendering::{
    conquest_overlay, ctf_overlay, render_map, Canvas, PixelCanvas, RenderOutcome, SpriteAnimator, SpriteSheet,
};
use tactics_viewer::ui::{is_user_in_game, CreateGameForm, Lobby, LobbyFilter, PlayerFilter, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tactics-viewer")]
#[command(about = "Match viewer client for the tactics backend")]
struct Args {
    /// Backend base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Request timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Read assets from this directory instead of the server
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Log in before running the command
    #[arg(short, long, requires = "password")]
    username: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List games
    Games {
        #[arg(value_enum)]
        kind: ListKind,
        /// Only games for exactly this many players
        #[arg(long)]
        players: Option<u8>,
        /// Only games on this map
        #[arg(long)]
        map: Option<String>,
        /// 1-based page of open games
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Create a game on an official map
    Create {
        name: String,
        map: String,
        #[arg(long, value_enum, default_value = "conquest")]
        mode: ModeArg,
        #[arg(long, default_value = "2")]
        players: u8,
        #[arg(long)]
        private: bool,
        #[arg(long)]
        unit_limit: Option<u32>,
        #[arg(long)]
        starting_cash: Option<u32>,
    },
    /// Join an open game
    Join { game_id: u64 },
    /// Start a game you host
    Start { game_id: u64 },
    /// Follow a match and log every refresh
    Watch {
        link: String,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Render a match's map to a PNG
    RenderMap {
        link: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Render one frame of a unit's idle animation to a PNG
    Sprite {
        asset_folder: String,
        /// Ticks to advance before drawing
        #[arg(long, default_value = "0")]
        ticks: u64,
        /// Composite the shadow layer
        #[arg(long)]
        shadow: bool,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListKind {
    Open,
    Completed,
    InProgress,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Conquest,
    War,
    CaptureTheFlag,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Conquest => GameMode::Conquest,
            ModeArg::War => GameMode::War,
            ModeArg::CaptureTheFlag => GameMode::CaptureTheFlag,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = ViewerConfig {
        server_url: args.server.clone(),
        request_timeout: Duration::from_millis(args.timeout_ms),
        ..ViewerConfig::default()
    };
    let api = Api::new(HttpClient::new(&config)?);
    let mut session = Session::new(api.clone());

    match (&args.username, &args.password) {
        (Some(username), Some(password)) => {
            session.login(username, password).await?;
        }
        _ => {
            session.restore().await;
        }
    }
    let user_id = session.user().map(|u| u.id);
    let lobby = Lobby::new(api.clone());

    match args.command {
        Command::Games { kind, players, map, page } => {
            let filter = LobbyFilter {
                players: players.map_or(PlayerFilter::All, PlayerFilter::Exactly),
                map,
            };
            let games = match kind {
                ListKind::Open => {
                    let listing = lobby.open_games(&filter, page).await?;
                    println!("page {}/{}", listing.page, listing.total_pages.max(1));
                    listing.games
                }
                ListKind::Completed => lobby.completed_games(&filter).await?,
                ListKind::InProgress => lobby.in_progress_games(&filter).await?,
            };
            for game in &games {
                let seated = if is_user_in_game(game, user_id) { " (joined)" } else { "" };
                println!(
                    "#{} {} [{}] {} {}/{} {}{}",
                    game.id,
                    game.game_name,
                    game.link,
                    game.map_name,
                    game.players.len(),
                    game.max_players,
                    game.timestamp,
                    seated
                );
            }
        }
        Command::Create {
            name,
            map,
            mode,
            players,
            private,
            unit_limit,
            starting_cash,
        } => {
            let maps = api.official_maps().await?;
            let Some(selected) = maps.iter().find(|m| m.name.eq_ignore_ascii_case(&map)) else {
                return Err(format!("unknown map {:?}", map).into());
            };
            let mut form = CreateGameForm {
                game_name: name,
                gamemode: mode.into(),
                max_players: players,
                is_private: private,
                unit_limit,
                starting_cash,
                ..CreateGameForm::default()
            };
            form.select_map(selected);
            let route = lobby.create(&form.to_request()?).await?;
            println!("{}", route);
        }
        Command::Join { game_id } => println!("{}", lobby.join(game_id).await?),
        Command::Start { game_id } => println!("{}", lobby.start(game_id).await?),
        Command::Watch { link, seconds } => watch(api, &config, link, seconds).await?,
        Command::RenderMap { link, out } => {
            let game = api.game(&link).await?;
            let outcome = match &args.assets_dir {
                Some(dir) => render_to_png(&LocalAssets::new(dir), &config, &game, user_id, &out).await?,
                None => render_to_png(&api, &config, &game, user_id, &out).await?,
            };
            tracing::info!("render {}: {:?}", link, outcome);
        }
        Command::Sprite {
            asset_folder,
            ticks,
            shadow,
            out,
        } => match &args.assets_dir {
            Some(dir) => sprite_to_png(&LocalAssets::new(dir), &asset_folder, ticks, shadow, &out).await?,
            None => sprite_to_png(&api, &asset_folder, ticks, shadow, &out).await?,
        },
    }

    Ok(())
}

async fn watch(api: Api, config: &ViewerConfig, link: String, seconds: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut sync = MatchSync::mount(api, link.as_str()).await;
    if let Some(e) = sync.error() {
        return Err(format!("failed to load match {}: {}", link, e).into());
    }
    if !sync.is_subscribed() {
        tracing::warn!("match {}: watching without live updates", link);
    }

    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
    let mut ticker = tokio::time::interval(config.repaint_interval());
    loop {
        ticker.tick().await;
        if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
            break;
        }
        if sync.pump().await {
            if let Some(state) = sync.state() {
                println!(
                    "{} {:?} players {}/{} units {} ready {}",
                    state.game.link,
                    state.game.status,
                    state.game.players.len(),
                    state.game.max_players,
                    state.units.len(),
                    sync.all_ready()
                );
            }
        }
    }
    Ok(())
}

async fn render_to_png<F: AssetFetcher>(
    fetcher: &F,
    config: &ViewerConfig,
    game: &Match,
    user_id: Option<u64>,
    out: &Path,
) -> Result<RenderOutcome, Box<dyn std::error::Error>> {
    let px = config.tile_px();
    let mut canvas = PixelCanvas::new(game.map.width as u32 * px, game.map.height as u32 * px);
    let seat = user_id.and_then(|id| game.seat_of(id)).unwrap_or(0);

    let outcome = render_map(fetcher, Some(&mut canvas), &game.map, config, |canvas: &mut PixelCanvas| {
        let Some(tiles) = game.map.tile_data.as_ref() else {
            return;
        };
        match game.gamemode {
            GameMode::Conquest => {
                conquest_overlay(canvas, tiles, seat, None, px);
            }
            GameMode::CaptureTheFlag => {
                ctf_overlay(canvas, tiles, px);
            }
            GameMode::War => {}
        }
    })
    .await?;

    if let RenderOutcome::Drawn { .. } = outcome {
        canvas.save(out)?;
        println!("wrote {} ({}x{})", out.display(), canvas.width(), canvas.height());
    }
    Ok(outcome)
}

async fn sprite_to_png<F: AssetFetcher>(
    fetcher: &F,
    asset_folder: &str,
    ticks: u64,
    with_shadow: bool,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = resolve_sprite(fetcher, asset_folder).await?;
    let shadow = if with_shadow {
        resolve_shadow(fetcher, &loaded).await
    } else {
        None
    };
    let Some(sheet) = SpriteSheet::from_loaded(loaded) else {
        return Err(format!("sprite sheet for {} failed to load", asset_folder).into());
    };

    let mut animator = SpriteAnimator::new(sheet, shadow);
    for _ in 0..ticks {
        animator.advance();
    }
    let (width, height) = animator.canvas_size();
    let mut canvas = PixelCanvas::new(width, height);
    animator.draw(&mut canvas);
    canvas.save(out)?;
    println!("wrote {} (frame {})", out.display(), animator.frame_index());
    Ok(())
}
