use anyhow::Context;
use clap::{value_parser, Arg, Command};
use minimech::{Browser, Config, ControlKind, Document, ElementFilter};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("minimech")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetches a page and lists its links and forms")
        .arg(Arg::new("url").required(true).help("Absolute URL to open"))
        .arg(
            Arg::new("user-agent")
                .long("user-agent")
                .value_name("UA")
                .help("User-Agent header to send"),
        )
        .arg(
            Arg::new("follow")
                .long("follow")
                .value_name("TEXT")
                .help("After opening, follow the link with this text"),
        )
        .arg(
            Arg::new("max-redirects")
                .long("max-redirects")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Redirects to follow before giving up"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = cli().get_matches();
    let url = matches
        .get_one::<String>("url")
        .context("missing URL argument")?;

    let mut config = Config::default();
    if let Some(user_agent) = matches.get_one::<String>("user-agent") {
        config = config.with_user_agent(user_agent.as_str());
    }
    if let Some(&max_redirects) = matches.get_one::<usize>("max-redirects") {
        config = config.with_max_redirects(max_redirects);
    }

    let mut browser = Browser::new(config).context("failed to set up HTTP client")?;

    info!("Opening {}", url);
    browser
        .open(url)
        .await
        .with_context(|| format!("failed to open {}", url))?;

    if let Some(text) = matches.get_one::<String>("follow") {
        info!("Following link {:?}", text);
        browser
            .follow_link(&ElementFilter::new().text(text), Some(0))
            .await
            .with_context(|| format!("failed to follow link {:?}", text))?;
    }

    if let Some(navigation) = browser.last_navigation() {
        info!(
            status = navigation.status,
            redirects = navigation.redirects,
            duration_ms = navigation.duration_ms,
            "Loaded {}",
            browser.url().map(|u| u.as_str()).unwrap_or_default()
        );
    }
    print_document(browser.document()?);
    Ok(())
}

fn print_document(document: &Document) {
    println!("URL:   {}", document.url());
    println!("Title: {}", document.title().unwrap_or_default());

    println!("\nLinks:");
    for link in document.links() {
        let target = link.url.map(|u| u.to_string()).unwrap_or(link.href);
        println!("  {} -> {}", link.text, target);
    }

    println!("\nForms:");
    for (index, form) in document.forms().enumerate() {
        println!(
            "  #{} {} {} ({})",
            index,
            form.method(),
            form.action(),
            form.name().or(form.id()).unwrap_or("unnamed")
        );
        for control in form.controls() {
            let value = match &control.kind {
                ControlKind::Text { value, .. }
                | ControlKind::Hidden { value }
                | ControlKind::Textarea { value }
                | ControlKind::Submit { value, image: false } => value.clone(),
                ControlKind::Submit { image: true, .. } => "(image)".to_string(),
                ControlKind::Checkbox { value, checked } | ControlKind::Radio { value, checked } => {
                    format!("{} [{}]", value, if *checked { "x" } else { " " })
                }
                ControlKind::SelectSingle { options, selected } => selected
                    .map(|i| options[i].value.clone())
                    .unwrap_or_default(),
                ControlKind::SelectMultiple { options, selected } => selected
                    .iter()
                    .map(|&i| options[i].value.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                ControlKind::File { .. } | ControlKind::Button => String::new(),
            };
            println!(
                "    {:<16} {:<10} {}{}",
                control.name().unwrap_or("-"),
                control.kind.type_name(),
                value,
                if control.disabled { " (disabled)" } else { "" }
            );
        }
    }
}
