use clap::{CommandFactory, Parser, ValueEnum, error::ErrorKind};
use lng_route_lib::router::MIN_STEP_KM;
use lng_route_lib::{DEFAULT_SPEED_KNOTS, Passage};
use std::path::PathBuf;

/// Routing backend selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    /// Built-in great-circle approximation (ignores passage restrictions)
    GreatCircle,
    /// External program speaking the JSON request / GeoJSON response protocol
    Command,
}

/// How results are printed
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    /// Map scene JSON for a renderer
    Json,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// LNG Route Planner - Plan sea routes between LNG terminals
pub struct Settings {
    /// CSV sheet of terminals
    #[clap(short, long, value_name = "FILE")]
    pub terminals: PathBuf,

    /// Start terminal name
    #[clap(short, long, requires = "end")]
    pub start: Option<String>,

    /// End terminal name
    #[clap(short, long, requires = "start")]
    pub end: Option<String>,

    /// Vessel speed in knots
    #[clap(long, default_value_t = DEFAULT_SPEED_KNOTS)]
    pub speed: f64,

    /// Passage to avoid (repeatable); the Northwest Passage is always avoided
    #[clap(short, long, value_name = "PASSAGE")]
    pub restrict: Vec<Passage>,

    /// Hide terminals with this status (repeatable, replaces the default)
    #[clap(long, value_name = "STATUS", default_value = "Cancelled")]
    pub exclude_status: Vec<String>,

    /// Only show terminals of this facility type (repeatable)
    #[clap(long, value_name = "TYPE")]
    pub facility_type: Vec<String>,

    /// Routing backend
    #[clap(long, value_enum, default_value_t = RouterKind::GreatCircle)]
    pub router: RouterKind,

    /// Program run by the command router
    #[clap(long, value_name = "PROGRAM", required_if_eq("router", "command"))]
    pub router_command: Option<PathBuf>,

    /// Argument for the router program (repeatable)
    #[clap(long, value_name = "ARG", allow_hyphen_values = true)]
    pub router_arg: Vec<String>,

    /// Give up on a routing request after this many seconds
    #[clap(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Maximum waypoint spacing of the great-circle router in kilometers
    #[clap(long, default_value = "100.0", value_parser = parse_step_km)]
    pub max_step_km: f64,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// List the visible terminals and exit
    #[clap(short, long, default_value = "false")]
    pub list: bool,

    /// Read `START -> END` requests from stdin until EOF or `quit`
    #[clap(short, long, default_value = "false", conflicts_with_all = ["start", "list"])]
    pub interactive: bool,

    /// Log debug details unless RUST_LOG says otherwise
    #[clap(short, long, default_value = "false")]
    pub verbose: bool,
}

/// Waypoint spacing in kilometers, no smaller than the router accepts
fn parse_step_km(value: &str) -> Result<f64, String> {
    let step: f64 = value
        .parse()
        .map_err(|_| format!("{value:?} is not a number"))?;
    if !step.is_finite() || step < MIN_STEP_KM {
        return Err(format!("must be at least {MIN_STEP_KM} km"));
    }
    Ok(step)
}

/// What a single invocation does
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    List,
    Route { start: String, end: String },
    Interactive,
}

impl Settings {
    /// Parse the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        let settings = Self::parse();
        if settings.mode().is_none() {
            Self::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "one of --start/--end, --list or --interactive is required",
                )
                .exit();
        }
        settings
    }

    /// Selected mode, `None` when nothing was asked for
    pub fn mode(&self) -> Option<Mode> {
        if self.interactive {
            return Some(Mode::Interactive);
        }
        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            return Some(Mode::Route {
                start: start.clone(),
                end: end.clone(),
            });
        }
        self.list.then_some(Mode::List)
    }
}
