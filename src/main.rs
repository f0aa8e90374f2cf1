use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postdeck::config::Config;
use postdeck::error::{ClientError, Result};
use postdeck::guard::can_mutate;
use postdeck::listing::controller::{ListingController, ListingStatus};
use postdeck::listing::owned::{OwnedBlogView, SortOrder};
use postdeck::models::blog::{BlogDraft, BlogPage, BlogQuerySpec, BlogSummary};
use postdeck::models::user::{LoginRequest, ProfileUpdate, RegisterRequest};
use postdeck::services::{auth, blogs, profile};
use postdeck::state::AppState;

#[derive(Parser)]
#[command(name = "postdeck")]
#[command(version)]
#[command(about = "Terminal front-end for the blog platform API")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Browse the public listing
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show one post
    Show { id: String },

    /// Publish a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        image: Option<String>,
    },

    /// Edit one of your posts; omitted fields keep their value
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },

    /// Delete one of your posts
    Delete { id: String },

    /// List your own posts
    Mine {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        oldest: bool,
    },

    /// Manage your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Change your name or picture
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete your account
    Delete,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    tracing::debug!("Configuration loaded: {:?}", config);

    let state = AppState::new(&config)?;

    if let Err(e) = run(&state, cli.command).await {
        eprintln!("{}", e);
        if let Some(hint) = error_hint(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// What the user can do next after `err`.
fn error_hint(err: &ClientError) -> Option<&'static str> {
    if err.requires_login() {
        Some("Run `postdeck login` to sign in.")
    } else if err.requires_redirect() {
        Some("This post is not available to you. Run `postdeck list` to browse others.")
    } else if err.is_retryable() {
        Some("Run the same command again to retry.")
    } else {
        None
    }
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            let request = RegisterRequest::new(name, email, password);
            auth::register(state, &request).await?;
            println!("Registration successful. You can now log in.");
        }
        Commands::Login { email, password } => {
            let request = LoginRequest::new(email, password);
            let session = auth::login(state, &request).await?;
            match session.current_user() {
                Some(user) => println!("Logged in as {}", user.label()),
                None => println!("Logged in"),
            }
        }
        Commands::Logout => {
            auth::logout(state).await?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let session = state.session.get_session();
            match (session.is_authenticated(), session.current_user()) {
                (true, Some(user)) => println!("[{}] {} ({})", user.initial(), user.label(), user.id),
                (true, None) => println!("Logged in"),
                (false, _) => println!("Not logged in"),
            }
        }
        Commands::List {
            category,
            author,
            search,
            page,
        } => {
            let mut spec = BlogQuerySpec::new(state.config.page_size);
            spec.set_category(category);
            spec.set_author(author);
            spec.set_search_term(search);
            spec.set_page(page);

            let controller = ListingController::with_spec(state.api.clone(), spec);
            controller.mount().await;

            if controller.status() == ListingStatus::Error {
                if let Some(e) = controller.error() {
                    return Err(e);
                }
            }
            if let Some(page) = controller.page() {
                print_page(&page);
                let authors = controller.displayed_authors();
                if !authors.is_empty() {
                    println!("Authors on this page: {}", authors.join(", "));
                }
            }
        }
        Commands::Show { id } => {
            let blog = blogs::fetch_blog(state, &id).await?;
            print_blog(&blog);
            if can_mutate(&state.session.get_session(), &blog) {
                println!("(yours: `postdeck edit {}` / `postdeck delete {}`)", blog.id, blog.id);
            }
        }
        Commands::Create {
            title,
            category,
            content,
            image,
        } => {
            let draft = BlogDraft::new(title, category, content, image);
            match blogs::create_blog(state, &draft).await? {
                Some(blog) => println!("Blog created: {}", blog.id),
                None => println!("Blog created"),
            }
        }
        Commands::Edit {
            id,
            title,
            category,
            content,
            image,
        } => {
            let blog = blogs::fetch_blog(state, &id).await?;
            let current = BlogDraft::from(&blog);
            let draft = BlogDraft::new(
                title.unwrap_or(current.title),
                category.unwrap_or(current.category),
                content.unwrap_or(current.content),
                image.or(current.image),
            );
            blogs::update_blog(state, &blog, &draft).await?;
            println!("Blog updated: {}", blog.id);
        }
        Commands::Delete { id } => {
            let blog = blogs::fetch_blog(state, &id).await?;
            blogs::delete_blog(state, &blog).await?;
            println!("Blog deleted: {}", blog.id);
        }
        Commands::Mine {
            category,
            title,
            oldest,
        } => {
            let mut view = OwnedBlogView::new(blogs::my_blogs(state).await?);
            view.set_category(category);
            view.set_title_filter(title);
            if oldest {
                view.set_order(SortOrder::Oldest);
            }

            if view.is_empty() {
                println!("You have not written any blogs yet.");
                return Ok(());
            }
            println!("Categories: {}", view.categories().join(", "));
            let visible = view.visible();
            if visible.is_empty() {
                println!("No blogs match these filters.");
            }
            for blog in visible {
                print_summary(blog);
            }
        }
        Commands::Profile { command } => match command {
            ProfileCommands::Show => {
                let profile = profile::get_profile(state).await?;
                println!("Name:  {}", profile.user_name.as_deref().unwrap_or("-"));
                println!("Email: {}", profile.email.as_deref().unwrap_or("-"));
                if let Some(image) = &profile.profile_image {
                    println!("Image: {}", image);
                }
            }
            ProfileCommands::Update { name, image } => {
                let update = ProfileUpdate::new(name, image);
                profile::update_profile(state, &update).await?;
                println!("Profile updated");
            }
            ProfileCommands::Delete => {
                profile::delete_account(state).await?;
                println!("Account deleted");
            }
        },
    }

    Ok(())
}

fn print_page(page: &BlogPage) {
    if page.is_empty() {
        println!("No blogs found.");
    }
    for blog in &page.items {
        print_summary(blog);
    }
    println!(
        "Page {} of {} ({} blogs)",
        page.current_page, page.total_pages, page.total_count
    );
}

fn print_summary(blog: &BlogSummary) {
    let date = blog
        .created_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    println!(
        "{}  [{}] {} by {} {}",
        blog.id,
        blog.category,
        blog.title,
        blog.author_label(),
        date
    );
    println!("    {}", blog.excerpt(100));
}

fn print_blog(blog: &BlogSummary) {
    println!("{}", blog.title);
    println!("{} | {}", blog.category, blog.author_label());
    if let Some(created_at) = blog.created_at {
        println!("{}", created_at.format("%B %-d, %Y"));
    }
    if let Some(image) = &blog.image {
        println!("{}", image);
    }
    println!();
    println!("{}", blog.content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use postdeck::error::RemoteErrorKind;

    fn remote(status: u16, kind: RemoteErrorKind) -> ClientError {
        ClientError::Remote {
            status,
            message: "failed".into(),
            kind,
        }
    }

    #[test]
    fn login_hint_wins() {
        let hint = error_hint(&remote(401, RemoteErrorKind::InvalidToken)).unwrap();
        assert!(hint.contains("postdeck login"));
        assert!(error_hint(&ClientError::AuthRequired).unwrap().contains("postdeck login"));
    }

    #[test]
    fn forbidden_views_point_back_to_the_listing() {
        let not_owner = ClientError::NotOwner {
            resource_id: "b2".into(),
        };
        assert!(error_hint(&not_owner).unwrap().contains("postdeck list"));
        assert!(error_hint(&remote(404, RemoteErrorKind::NotFound)).unwrap().contains("postdeck list"));
    }

    #[test]
    fn transient_failures_offer_a_retry() {
        let network = ClientError::Network("connection refused".into());
        assert!(error_hint(&network).unwrap().contains("retry"));
        assert!(error_hint(&remote(500, RemoteErrorKind::Other)).unwrap().contains("retry"));
    }

    #[test]
    fn local_errors_have_no_hint() {
        assert_eq!(error_hint(&ClientError::validation("title", "too short")), None);
        assert_eq!(error_hint(&ClientError::Storage("disk full".into())), None);
    }
}
