//! `vidshare` terminal front end.
//!
//! Each subcommand composes the library's session, clients and view state.
//! Rendered output goes to stdout; logs and errors go to stderr.


use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use vidshare::net::Clients;
use vidshare::net::backend::Backend;
use vidshare::net::http::HttpBackend;
use vidshare::net::types::{CommentId, Video, VideoId, VideoUpdateRequest};
use vidshare::state::comment_section::CommentSection;
use vidshare::state::comment_tree::SectionEvent;
use vidshare::state::feed::VideoFeed;
use vidshare::state::session::Session;
use vidshare::state::store::{FileStore, KeyValueStore};
use vidshare::state::token_session::TokenSession;
use vidshare::state::video_view::{VideoView, VideoViewState};
use vidshare::util::format::{format_view_count, time_since};
use vidshare::{ClientConfig, ClientError, ConfigError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "vidshare", about = "Video-sharing client")]
struct Cli {
    /// API base URL, including the `/api` prefix.
    #[arg(long, env = "VIDSHARE_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding persisted session storage.
    #[arg(long, env = "VIDSHARE_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Log verbosity on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    email: String,
    #[arg(long, env = "VIDSHARE_PASSWORD")]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log into it.
    Register(CredentialArgs),
    Login(CredentialArgs),
    Logout,
    /// Print the logged-in identity.
    Whoami,
    /// List the home feed.
    Videos {
        #[arg(long, default_value_t = 1)]
        pages: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Print one video with its counters and comments.
    Show { id: VideoId },
    /// Open an interactive view of a video.
    Watch { id: VideoId },
    /// Edit a video you own. Omitted fields keep their current value.
    Edit {
        id: VideoId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Save a video's stream to a file.
    Download {
        id: VideoId,
        #[arg(long)]
        out: PathBuf,
    },
    /// Bearer-token account commands.
    Token(TokenCommand),
}

#[derive(Args, Debug)]
struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Subcommand, Debug)]
enum TokenSubcommand {
    Signup(CredentialArgs),
    Signin(CredentialArgs),
    Signout,
    Status,
}

struct App {
    config: ClientConfig,
    http: Arc<HttpBackend>,
    store: Arc<FileStore>,
    session: Session,
    clients: Clients,
}

impl App {
    fn build(config: ClientConfig) -> Result<Self, CliError> {
        let http = Arc::new(HttpBackend::new(&config)?);
        let store = Arc::new(FileStore::open(config.storage_path())?);
        let session = Session::restore(
            Arc::clone(&http) as Arc<dyn Backend>,
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
        );
        let clients = Clients::new(&session);
        Ok(Self { config, http, store, session, clients })
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_owned();
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }
    let app = App::build(config)?;

    match cli.command {
        Command::Register(args) => {
            let identity = app.session.register(&args.email, &args.password).await?;
            println!("registered and logged in as {} (user {})", identity.email, identity.id);
            Ok(())
        }
        Command::Login(args) => {
            let identity = app.session.login(&args.email, &args.password).await?;
            println!("logged in as {}", identity.email);
            Ok(())
        }
        Command::Logout => {
            app.session.logout()?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&app),
        Command::Videos { pages, size } => run_videos(&app, pages, size).await,
        Command::Show { id } => run_show(&app, id).await,
        Command::Watch { id } => run_watch(&app, id).await,
        Command::Edit { id, title, description, category } => run_edit(&app, id, title, description, category).await,
        Command::Download { id, out } => {
            let bytes = app.http.download_stream(&app.session.auth_headers(), id, &out).await?;
            println!("wrote {bytes} bytes to {}", out.display());
            Ok(())
        }
        Command::Token(token) => run_token(&app, token).await,
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

fn run_whoami(app: &App) -> Result<(), CliError> {
    match app.session.current_identity() {
        Some(identity) => print_json(&identity),
        None => {
            println!("not logged in");
            Ok(())
        }
    }
}

async fn run_videos(app: &App, pages: u32, size: Option<u32>) -> Result<(), CliError> {
    let mut feed = VideoFeed::new(size.unwrap_or(app.config.page_size));
    for _ in 0..pages {
        if !feed.has_more {
            break;
        }
        feed.load_more(&app.clients.videos).await?;
    }
    let now = now();
    for video in &feed.videos {
        print!("{}", render_video_card(video, now));
    }
    if feed.has_more {
        println!("(more videos available: --pages {})", feed.current_page + 1);
    }
    Ok(())
}

async fn run_show(app: &App, id: VideoId) -> Result<(), CliError> {
    let videos = &app.clients.videos;
    let video = videos.get(id).await?;
    let state = VideoViewState {
        video_id: id,
        is_authenticated: app.session.is_authenticated(),
        is_liked: videos.has_user_liked(id).await?,
        like_count: videos.like_count(id).await?,
        is_subscribed: match video.channel_id() {
            Some(channel) => app.clients.channels.is_subscribed(channel).await?,
            None => false,
        },
        subscriber_count: match video.channel_id() {
            Some(channel) => app.clients.channels.subscriber_count(channel).await?,
            None => 0,
        },
        comments: app.clients.comments.list_for_video(id).await?,
        video: Some(video),
        load_error: None,
    };
    let mut section = CommentSection::new(id, app.clients.comments.clone());
    section.sync(state.comments.clone()).await;
    print!("{}", render_view(&state, &section, now()));
    println!("stream: {}", videos.stream_url(id));
    Ok(())
}

async fn run_edit(
    app: &App,
    id: VideoId,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
) -> Result<(), CliError> {
    let current = app.clients.videos.get(id).await?;
    let request = VideoUpdateRequest {
        title: title.unwrap_or(current.title),
        description: description.unwrap_or(current.description),
        category: category.unwrap_or(current.category),
    };
    let updated = app.clients.videos.update(id, &request).await?;
    print_json(&updated)
}

async fn run_token(app: &App, token: TokenCommand) -> Result<(), CliError> {
    let session = TokenSession::restore(
        Arc::clone(&app.http) as Arc<dyn Backend>,
        Arc::clone(&app.store) as Arc<dyn KeyValueStore>,
    );
    match token.command {
        TokenSubcommand::Signup(args) => {
            let message = session.sign_up(&args.email, &args.password).await?;
            println!("{message}");
        }
        TokenSubcommand::Signin(args) => {
            session.sign_in(&args.email, &args.password).await?;
            println!("signed in");
        }
        TokenSubcommand::Signout => {
            session.logout()?;
            println!("signed out");
        }
        TokenSubcommand::Status => {
            println!("{}", if session.is_logged_in() { "signed in" } else { "signed out" });
        }
    }
    Ok(())
}

// =============================================================================
// INTERACTIVE WATCH
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum WatchCommand {
    Like,
    Subscribe,
    Comment(String),
    Reply(CommentId, String),
    Replies(CommentId),
    CommentLike(CommentId),
    Refresh,
    Help,
    Quit,
}

const WATCH_HELP: &str = "\
commands:
  like                 toggle your like on the video
  sub                  toggle your subscription to the channel
  comment <text>       post a comment
  reply <id> <text>    reply to comment <id>
  replies <id>         show or hide replies of comment <id>
  clike <id>           toggle your like on comment <id>
  refresh              reload comments
  help                 show this list
  quit                 leave the video";

fn parse_watch_command(line: &str) -> Result<WatchCommand, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let comment_id = |raw: &str| raw.parse::<CommentId>().map_err(|_| format!("not a comment id: {raw:?}"));

    match verb {
        "like" => Ok(WatchCommand::Like),
        "sub" | "subscribe" => Ok(WatchCommand::Subscribe),
        "comment" => Ok(WatchCommand::Comment(rest.to_owned())),
        "reply" => {
            let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Ok(WatchCommand::Reply(comment_id(id)?, text.trim().to_owned()))
        }
        "replies" => Ok(WatchCommand::Replies(comment_id(rest)?)),
        "clike" => Ok(WatchCommand::CommentLike(comment_id(rest)?)),
        "refresh" => Ok(WatchCommand::Refresh),
        "help" | "?" => Ok(WatchCommand::Help),
        "quit" | "q" | "exit" => Ok(WatchCommand::Quit),
        "" => Err("empty command; try `help`".to_owned()),
        other => Err(format!("unknown command {other:?}; try `help`")),
    }
}

async fn run_watch(app: &App, id: VideoId) -> Result<(), CliError> {
    let view = VideoView::open(id, app.clients.clone(), app.session.clone(), app.config.comment_poll_period());
    let mut section = CommentSection::new(id, app.clients.comments.clone());
    let mut updates = view.subscribe();
    let mut identity = app.session.identity();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut synced_comments = Vec::new();
    println!("{WATCH_HELP}");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.comments != synced_comments {
                    synced_comments.clone_from(&state.comments);
                    section.sync(state.comments.clone()).await;
                }
                print!("{}", render_view(&state, &section, now()));
            }
            Ok(()) = identity.changed() => {
                section.on_identity_change().await;
                print!("{}", render_view(&view.state(), &section, now()));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match parse_watch_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    }
                };
                if command == WatchCommand::Quit {
                    break;
                }
                if let Err(e) = run_watch_command(&view, &mut section, command).await {
                    eprintln!("error: {e}");
                }
                print!("{}", render_view(&view.state(), &section, now()));
            }
        }
    }
    view.close();
    Ok(())
}

async fn run_watch_command(
    view: &VideoView,
    section: &mut CommentSection,
    command: WatchCommand,
) -> Result<(), ClientError> {
    match command {
        WatchCommand::Like => {
            view.toggle_like().await?;
        }
        WatchCommand::Subscribe => {
            view.toggle_subscribe().await?;
        }
        WatchCommand::Comment(text) => {
            let SectionEvent::CommentAdded(_) = section.submit_comment(&text).await?;
            view.refresh_comments()?;
        }
        WatchCommand::Reply(parent, text) => {
            let SectionEvent::CommentAdded(_) = section.tree_mut().submit_reply(parent, &text).await?;
            view.refresh_comments()?;
        }
        WatchCommand::Replies(comment_id) => {
            section.tree_mut().toggle_replies(comment_id).await?;
        }
        WatchCommand::CommentLike(comment_id) => {
            section.tree_mut().toggle_like(comment_id).await?;
        }
        WatchCommand::Refresh => view.refresh_comments()?,
        WatchCommand::Help => println!("{WATCH_HELP}"),
        WatchCommand::Quit => {}
    }
    Ok(())
}

// =============================================================================
// RENDERING
// =============================================================================

fn render_video_card(video: &Video, now: OffsetDateTime) -> String {
    let channel = video.channel.as_ref().map_or("unknown channel", |c| c.name.as_str());
    format!(
        "#{:<6} {}\n        {} · {} · {}\n",
        video.id,
        video.title,
        channel,
        format_view_count(video.view_count),
        time_since(&video.created_at, now),
    )
}

fn render_view(state: &VideoViewState, section: &CommentSection, now: OffsetDateTime) -> String {
    let mut out = String::new();
    match (&state.video, &state.load_error) {
        (Some(video), _) => {
            out.push_str(&format!("\n== {} ==\n", video.title));
            let channel = video.channel.as_ref().map_or("unknown channel", |c| c.name.as_str());
            let subscribed = if state.is_subscribed { " (subscribed)" } else { "" };
            out.push_str(&format!("{channel} · {} subscribers{subscribed}\n", state.subscriber_count));
            out.push_str(&format!(
                "{} · {} · {}\n",
                format_view_count(video.view_count),
                time_since(&video.created_at, now),
                video.category,
            ));
            let liked = if state.is_liked { " (liked)" } else { "" };
            out.push_str(&format!("{} likes{liked}\n", state.like_count));
            if !video.description.is_empty() {
                out.push_str(&format!("\n{}\n", video.description));
            }
        }
        (None, Some(error)) => out.push_str(&format!("\nfailed to load video {}: {error}\n", state.video_id)),
        (None, None) => out.push_str(&format!("\nloading video {}...\n", state.video_id)),
    }
    if !state.is_authenticated {
        out.push_str("(log in to like, subscribe or comment)\n");
    }
    out.push_str(&format!("\n-- {} comments --\n", state.comments.len()));
    out.push_str(&section.tree().render(now));
    out
}
