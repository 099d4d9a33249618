// ============================================================================
// BLOG CLIENT - command-line front end over the client stores
// ============================================================================

// - Browse, search and paginate published posts
// - Post details with comments
// - Login/register/logout with a persisted session
// - Likes and comments

use blog_client::{
    AppState, ClientConfig,
    dto::{LoginRequest, RegisterRequest},
    messages::format_date,
    models::{Post, PostId},
    stores::SearchUpdate,
};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "blog-client", about = "Browse the blog from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List published posts, optionally filtered
    Posts {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        category: Option<i64>,
        #[arg(short, long)]
        tag: Option<i64>,
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Most viewed posts
    Featured,
    /// Newest posts
    Recent,
    /// Show one post with its comments
    Show { id: PostId },
    /// List categories and tags
    Vocabulary,
    Like { id: PostId },
    Comment { id: PostId, content: String },
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Register {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Refresh and print the signed-in profile
    Whoami,
}

fn print_summary(post: &Post, config: &ClientConfig) {
    println!(
        "#{:<4} {}  ({}, {} views, {} likes)",
        post.id,
        post.title,
        format_date(&post.created_at, config.locale),
        post.views,
        post.likes
    );
}

async fn run(command: Command, state: &AppState, config: &ClientConfig) -> Result<(), String> {
    let content = &state.content;
    let session = &state.session;

    match command {
        Command::Posts {
            query,
            category,
            tag,
            page,
        } => {
            content.fetch_posts().await.map_err(|e| e.to_string())?;
            content.set_search_params(SearchUpdate {
                query,
                category: category.map(Some),
                tag: tag.map(Some),
                page,
            });
            let page = content.paginated_posts();
            for post in &page.items {
                print_summary(post, config);
            }
            println!("page {}/{} ({} posts)", page.page, page.total_pages, page.total);
        }
        Command::Featured | Command::Recent => {
            content.fetch_posts().await.map_err(|e| e.to_string())?;
            let posts = match command {
                Command::Featured => content.featured_posts(),
                _ => content.recent_posts(),
            };
            for post in &posts {
                print_summary(post, config);
            }
        }
        Command::Show { id } => {
            let post = content
                .fetch_post_by_id(id)
                .await
                .ok_or_else(|| content.error().unwrap_or_default())?;
            print_summary(&post, config);
            println!("{}\n", post.content);
            for comment in post.comments() {
                println!(
                    "  {} ({}): {}",
                    comment.author,
                    format_date(&comment.created_at, config.locale),
                    comment.content
                );
            }
        }
        Command::Vocabulary => {
            tokio::join!(content.fetch_categories(), content.fetch_tags());
            for category in content.categories() {
                println!("category {:<4} {}", category.id, category.name);
            }
            for tag in content.tags() {
                println!("tag      {:<4} {}", tag.id, tag.name);
            }
        }
        Command::Like { id } => {
            let likes = content.like_post(id).await.map_err(|e| e.to_string())?;
            println!("#{id}: {likes} likes");
        }
        Command::Comment { id, content: text } => {
            let comment = content
                .add_comment(id, text)
                .await
                .map_err(|e| e.to_string())?;
            println!("comment #{} added to #{id}", comment.id);
        }
        Command::Login { username, password } => {
            let user = session
                .login(LoginRequest { username, password })
                .await
                .map_err(|e| e.to_string())?;
            println!("logged in as {}", user.username);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = session
                .register(RegisterRequest {
                    username,
                    email,
                    password,
                    first_name: None,
                    last_name: None,
                })
                .await
                .map_err(|e| e.to_string())?;
            println!("registered {}", user.username);
        }
        Command::Logout => {
            session.logout();
            println!("logged out");
        }
        Command::Whoami => match session.fetch_user_info().await.map_err(|e| e.to_string())? {
            Some(user) => println!("{} <{}> {:?}", user.full_name(), user.email, user.role),
            None => println!("not logged in"),
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blog_client=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(err) => {
            error!("failed to initialise client: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &state, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
