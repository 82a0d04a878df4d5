//! `farm`: terminal dashboard for the farming-assistant backend.

mod views;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use farm_core::types::{CropDraft, CropStatus, Credentials, NewAccount, Profile, ProfileUpdate};
use farm_core::{
    ApiClient, ApiError, ClientConfig, FarmApi, FileSessionStore, RecordingNavigator, SessionContext, SessionStore,
};
use tracing_subscriber::EnvFilter;

use views::{ChatView, CropEditor, CropListView, DashboardView, SuggestionsView, WeatherView};

#[derive(Parser)]
#[command(name = "farm", version, about = "FarmerGPT smart farming assistant")]
struct Cli {
    /// Backend base URL. Defaults to $FARM_API_URL, then http://localhost:8000/api.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session tokens are kept between runs.
    #[arg(long, env = "FARM_SESSION_FILE", global = true)]
    session_file: Option<PathBuf>,

    /// Log every request (same as RUST_LOG=farm_core=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "FARM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in farmer.
    Whoami,
    /// Show or update the farmer profile.
    Profile(ProfileArgs),
    /// Manage crop records.
    #[command(subcommand)]
    Crops(CropsCommand),
    /// Current weather and short forecast.
    Weather {
        #[arg(default_value = "Delhi")]
        location: String,
    },
    /// Growing guide for a crop, or for all crops.
    Suggest { crop: Option<String> },
    /// Ask the assistant. Without a message, starts an interactive chat.
    Chat { message: Vec<String> },
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(short, long)]
    username: String,
    #[arg(short, long, env = "FARM_PASSWORD", hide_env_values = true)]
    password: String,
    /// Defaults to `--password`.
    #[arg(long)]
    confirm_password: Option<String>,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Acres.
    #[arg(long)]
    land_size: Option<String>,
    #[arg(long)]
    experience_years: Option<i32>,
}

#[derive(Subcommand)]
enum CropsCommand {
    List,
    Add(CropFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: CropFields,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args)]
struct CropFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    variety: Option<String>,
    /// Acres.
    #[arg(long)]
    area: Option<String>,
    /// YYYY-MM-DD.
    #[arg(long)]
    planting_date: Option<String>,
    /// YYYY-MM-DD.
    #[arg(long)]
    expected_harvest_date: Option<String>,
    #[arg(long)]
    status: Option<CropStatus>,
    #[arg(long)]
    notes: Option<String>,
}

impl CropFields {
    /// Lay the given flags over `draft`.
    fn apply(self, draft: &mut CropDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(variety) = self.variety {
            draft.variety = Some(variety);
        }
        if let Some(area) = self.area {
            draft.area = area;
        }
        if let Some(date) = self.planting_date {
            draft.planting_date = date;
        }
        if let Some(date) = self.expected_harvest_date {
            draft.expected_harvest_date = date;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(notes) = self.notes {
            draft.notes = Some(notes);
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "farm_core=debug" } else { "farm_core=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default.parse()?))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let session_path = cli.session_file.unwrap_or_else(FileSessionStore::default_path);
    let store = Rc::new(
        FileSessionStore::open(&session_path)
            .with_context(|| format!("opening session file {}", session_path.display()))?,
    );
    let navigator = Rc::new(RecordingNavigator::new());
    let context = SessionContext::new(store.clone(), navigator.clone());
    let config = match cli.api_url.as_deref() {
        Some(url) => ClientConfig::with_base_url_override(Some(url)),
        None => ClientConfig::from_env(),
    };
    let login_route = config.login_route.clone();
    let api = FarmApi::new(ApiClient::connect(config, context));

    let result = run(&api, &*store, cli.command);

    if navigator.take().iter().any(|route| *route == login_route) {
        eprintln!("You are signed out. Run `farm login` to continue.");
    }
    result
}

fn run(api: &FarmApi, store: &dyn SessionStore, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let credentials = Credentials { username, password };
            match api.sign_in(&credentials) {
                Ok(_) => println!("Signed in as {}.", credentials.username),
                Err(err) => bail!(
                    "{}",
                    err.server_message()
                        .unwrap_or_else(|| "Login failed. Please check your credentials.".to_string())
                ),
            }
        }
        Command::Register(args) => {
            let account = NewAccount {
                password2: args.confirm_password.unwrap_or_else(|| args.password.clone()),
                username: args.username,
                email: args.email,
                password: args.password,
                first_name: args.first_name,
                last_name: args.last_name,
                phone: args.phone,
                location: args.location,
            };
            if let Err(err) = api.sign_up(&account) {
                let detail = match &err {
                    ApiError::Status { body, .. } => body.clone(),
                    other => other.to_string(),
                };
                bail!("Registration failed: {detail}");
            }
            println!("Welcome, {}! You are signed in.", account.username);
        }
        Command::Logout => {
            api.logout();
            println!("Signed out.");
        }
        Command::Whoami => {
            require_session(store)?;
            let mut view = DashboardView::default();
            view.load(api);
            print!("{}", view.render());
        }
        Command::Profile(args) => {
            require_session(store)?;
            let update = ProfileUpdate {
                phone: args.phone,
                location: args.location,
                land_size: args.land_size,
                experience_years: args.experience_years,
            };
            let unchanged = update.phone.is_none()
                && update.location.is_none()
                && update.land_size.is_none()
                && update.experience_years.is_none();
            let outcome = if unchanged {
                api.profile()
            } else {
                api.update_profile(&update)
            };
            match outcome.and_then(|resp| resp.json::<Profile>()) {
                Ok(profile) => print_profile(&profile),
                Err(err) => bail!("Could not load your profile: {err}"),
            }
        }
        Command::Crops(cmd) => {
            require_session(store)?;
            let mut view = CropListView::default();
            match cmd {
                CropsCommand::List => view.load(api),
                CropsCommand::Add(fields) => {
                    let mut draft = CropDraft::default();
                    fields.apply(&mut draft);
                    view.save(api, &CropEditor::new(draft));
                }
                CropsCommand::Update { id, fields } => {
                    let mut editor = match view.editor_for(api, id) {
                        Ok(editor) => editor,
                        Err(message) => bail!("{message}"),
                    };
                    fields.apply(&mut editor.draft);
                    view.save(api, &editor);
                }
                CropsCommand::Delete { id } => view.delete(api, id),
            }
            print!("{}", view.render());
        }
        Command::Weather { location } => {
            require_session(store)?;
            let mut view = WeatherView::new(location);
            view.load(api);
            print!("{}", view.render());
        }
        Command::Suggest { crop } => {
            require_session(store)?;
            let mut view = SuggestionsView::default();
            view.select(api, crop.as_deref());
            print!("{}", view.render());
        }
        Command::Chat { message } => {
            require_session(store)?;
            chat(api, &message.join(" "))?;
        }
    }
    Ok(())
}

/// Views are only reachable with a stored session, like the routed dashboard.
fn require_session(store: &dyn SessionStore) -> Result<()> {
    if !store.is_authenticated() {
        bail!("Not signed in. Run `farm login` first.");
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    if let Some(user) = &profile.user {
        println!("{} (@{})", user.display_name(), user.username);
    }
    println!("Phone:      {}", profile.phone.as_deref().unwrap_or("-"));
    println!("Location:   {}", profile.location.as_deref().unwrap_or("-"));
    println!("Land size:  {}", profile.land_size.as_deref().unwrap_or("-"));
    match profile.experience_years {
        Some(years) => println!("Experience: {years} years"),
        None => println!("Experience: -"),
    }
}

fn chat(api: &FarmApi, message: &str) -> Result<()> {
    let mut view = ChatView::default();
    if !message.trim().is_empty() {
        let shown = view.lines.len();
        view.send(api, message);
        print!("{}", view.render_from(shown));
        return Ok(());
    }

    print!("{}", view.render());
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        let shown = view.lines.len();
        view.send(api, line);
        print!("{}", view.render_from(shown));
        if !api.client().session().is_authenticated() {
            break;
        }
    }
    Ok(())
}
