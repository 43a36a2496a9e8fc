use clap::Parser;
use linkboard::config::{self, Backend, Credentials};
use linkboard::session::MAX_SESSION_HOURS;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "Linkboard")]
#[command(version)]
#[command(about = "A link-sharing page with an admin panel.", long_about = None)]
struct Args {
    /// Host to listen on
    #[arg(long, env = "LINKBOARD_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "LINKBOARD_PORT", default_value_t = 4000)]
    port: u16,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 8)]
    thread: usize,

    /// Storage backend: `sqlite` or `file`
    #[arg(long, env = "LINKBOARD_BACKEND", default_value = "sqlite")]
    backend: Backend,

    /// SQLite database path, or JSON file path for the file backend
    #[arg(long, env = "DATABASE_URL")]
    database: String,

    /// Admin username
    #[arg(long, env = "ADMIN_USERNAME")]
    admin_username: String,

    /// Admin password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Secret key for signing sessions
    #[arg(short, long, env = "SECRET_KEY", hide_env_values = true)]
    secret: Option<String>,

    /// Session lifetime in hours
    #[arg(
        long,
        env = "LINKBOARD_SESSION_HOURS",
        default_value_t = 12,
        value_parser = clap::value_parser!(i64).range(1..=MAX_SESSION_HOURS)
    )]
    session_hours: i64,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let directive = if args.debug {
        "linkboard=debug"
    } else {
        "linkboard=info"
    };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let secret = linkboard::resolve_secret(args.secret.clone());

    let admin = Credentials::new(args.admin_username.clone(), args.admin_password.clone());
    let config = config::Config::new(secret, args.database.clone(), args.backend, admin)
        .with_session_hours(args.session_hours);

    info!("Starting with {} worker threads", args.thread);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.thread.max(1))
        .enable_all()
        .build()?
        .block_on(linkboard::run(&args.host, args.port, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let base = [
            "linkboard",
            "--database",
            ":memory:",
            "--admin-username",
            "admin",
            "--admin-password",
            "admin",
        ];
        Args::try_parse_from(base.iter().chain(extra.iter()).copied())
    }

    #[test]
    fn session_hours_must_be_in_range() {
        assert_eq!(parse(&[]).unwrap().session_hours, 12);
        assert_eq!(parse(&["--session-hours", "8760"]).unwrap().session_hours, 8760);
        assert!(parse(&["--session-hours", "0"]).is_err());
        assert!(parse(&["--session-hours", "-5"]).is_err());
        assert!(parse(&["--session-hours", "9223372036854775"]).is_err());
    }

    #[test]
    fn backend_flag_is_parsed() {
        let args = parse(&["--backend", "file"]).unwrap();
        assert_eq!(args.backend, Backend::File);
    }
}
