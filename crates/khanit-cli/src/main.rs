use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use khanit_renderer::css::generate_css;
use khanit_renderer::slug::slugify;
use khanit_renderer::toc::TableOfContents;
use khanit_renderer::post::Author;
use khanit_renderer::{ArticlePage, Post, RenderConfig, Segmenter};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about = "Khanit - render math-heavy markdown articles to html", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a KDL config file
    #[arg(long, global = true, env = "KHANIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an article to a complete html page
    Render {
        /// Markdown body, or `-` for stdin
        input: PathBuf,

        /// Article title
        #[arg(long)]
        title: String,

        /// Url slug; derived from the title when omitted
        #[arg(long)]
        slug: Option<String>,

        /// Short summary for the page description and share sheet
        #[arg(long, default_value = "")]
        excerpt: String,

        /// Tag, may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Publication date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        author: Option<String>,

        /// Image shown under the title
        #[arg(long)]
        featured_image: Option<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the segments of a markdown body as json
    Segments {
        /// Markdown body, or `-` for stdin
        input: PathBuf,
    },
    /// Print the heading outline of a markdown body as json
    Toc {
        /// Markdown body, or `-` for stdin
        input: PathBuf,
    },
    /// Print the article stylesheet
    Css,
    /// Print the url slug for a title
    Slug {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn main() -> Result<()> {
    init_miette();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            input,
            title,
            slug,
            excerpt,
            tags,
            date,
            author,
            featured_image,
            output,
        } => {
            let content = read_input(&input)?;
            let slug = slug.unwrap_or_else(|| slugify(&title));
            let mut post = Post::new(title, slug, content);
            post.excerpt = excerpt;
            post.tags = tags.into_iter().map(Into::into).collect();
            post.published_at = date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc());
            post.author = author.map(Author::new);
            post.featured_image = featured_image;

            let html = ArticlePage::new(&post, &config).render()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, html)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), "rendered article");
                }
                None => print!("{html}"),
            }
        }
        Commands::Segments { input } => {
            let content = read_input(&input)?;
            let segments = Segmenter::default()
                .with_hard_breaks(config.hard_breaks)
                .segment(&content)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&segments).into_diagnostic()?
            );
        }
        Commands::Toc { input } => {
            let content = read_input(&input)?;
            let toc = TableOfContents::from_document(&content);
            println!(
                "{}",
                serde_json::to_string_pretty(toc.headings()).into_diagnostic()?
            );
        }
        Commands::Css => {
            print!("{}", generate_css(&config)?);
        }
        Commands::Slug { text } => {
            println!("{}", slugify(&text.join(" ")));
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .into_diagnostic()
            .wrap_err("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> Result<RenderConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("no config file, using defaults");
                return Ok(RenderConfig::default());
            }
        },
    };

    let source = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let config = RenderConfig::from_kdl(&source)
        .map_err(|err| miette::Report::new(err).with_source_code(source))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("khanit").join("config.kdl"))
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
