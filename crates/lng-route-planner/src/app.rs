//! Request handling for one-shot and interactive use

use crate::output;
use crate::settings::{Mode, OutputFormat, RouterKind, Settings};
use lng_route_lib::{
    CommandRouter, CommandRouterConfig, FacilityType, GreatCircleConfig, GreatCircleRouter,
    LoadError, MaritimeRouter, RegistryCache, RouteOptions, RouteProjector, Status,
    TerminalFilter, TimeoutRouter,
};
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Routes remembered across interactive requests
const ROUTE_CACHE_SIZE: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Planner(#[from] lng_route_lib::Error),

    #[error("Failed to load terminals: {0}")]
    Load(#[from] LoadError),

    #[error("Output error: {0}")]
    Io(#[from] io::Error),

    #[error("--router command requires --router-command")]
    MissingRouterCommand,
}

/// One line of interactive input
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Route { start: String, end: String },
    List,
    Help,
    Quit,
    Empty,
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => return Ok(Self::Empty),
            "list" => return Ok(Self::List),
            "help" | "?" => return Ok(Self::Help),
            "quit" | "exit" => return Ok(Self::Quit),
            _ => {}
        }
        let (start, end) = line
            .split_once("->")
            .ok_or_else(|| format!("expected `START -> END`, got {line:?}"))?;
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(format!("expected `START -> END`, got {line:?}"));
        }
        Ok(Self::Route {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

const HELP: &str = "\
Commands:
  START -> END   compute the route between two terminals
  list           show the visible terminals
  help           show this message
  quit           leave";

/// Build the routing backend selected on the command line
pub fn build_router(settings: &Settings) -> Result<Box<dyn MaritimeRouter>, AppError> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    Ok(match settings.router {
        RouterKind::GreatCircle => Box::new(TimeoutRouter::new(
            GreatCircleRouter::new(GreatCircleConfig {
                max_step_km: settings.max_step_km,
            }),
            timeout,
        )),
        RouterKind::Command => {
            let program = settings
                .router_command
                .clone()
                .ok_or(AppError::MissingRouterCommand)?;
            Box::new(CommandRouter::new(CommandRouterConfig {
                program,
                args: settings.router_arg.clone(),
                timeout,
            }))
        }
    })
}

/// Registry source, router and view settings for handling requests
pub struct Planner<R> {
    registries: RegistryCache,
    projector: RouteProjector<R>,
    filter: TerminalFilter,
    options: RouteOptions,
    format: OutputFormat,
}

impl<R: MaritimeRouter> Planner<R> {
    pub fn new(settings: &Settings, router: R) -> Self {
        Self {
            registries: RegistryCache::new(&settings.terminals),
            projector: RouteProjector::with_cache(
                router,
                NonZeroUsize::new(ROUTE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
            filter: TerminalFilter {
                excluded_statuses: settings
                    .exclude_status
                    .iter()
                    .map(|status| Status::parse(status))
                    .collect(),
                facility_types: settings
                    .facility_type
                    .iter()
                    .map(|facility_type| FacilityType::parse(facility_type))
                    .collect(),
            },
            options: RouteOptions {
                speed_knots: settings.speed,
                restricted_passages: settings.restrict.iter().copied().collect(),
            },
            format: settings.format,
        }
    }

    /// Print the terminals that pass the view filter
    pub fn list<W: Write>(&self, out: &mut W) -> Result<(), AppError> {
        let registry = self.registries.get()?;
        let terminals = registry.filter(&self.filter);
        output::write_terminals(out, &terminals, self.format)?;
        Ok(())
    }

    /// Compute and print one route
    ///
    /// Names resolve against every loaded terminal, not only the visible ones.
    pub fn route<W: Write>(&self, start: &str, end: &str, out: &mut W) -> Result<(), AppError> {
        let registry = self.registries.get()?;
        let route = self
            .projector
            .compute_route(&registry, start, end, &self.options)?;
        let terminals = registry.filter(&self.filter);
        output::write_route(out, &route, &terminals, self.format)?;
        Ok(())
    }

    /// Serve requests line by line until EOF or `quit`
    ///
    /// A failed request is reported and the loop keeps going. Only output
    /// failures end the session.
    pub fn interactive<I: BufRead, W: Write>(&self, input: I, out: &mut W) -> Result<(), AppError> {
        let prompt = self.format == OutputFormat::Text;
        if prompt {
            writeln!(out, "Enter `START -> END`, `list`, `help` or `quit`.")?;
        }
        tracing::info!("Ready for requests");

        for line in input.lines() {
            let line = line?;
            let outcome = match Request::parse(&line) {
                Ok(Request::Empty) => continue,
                Ok(Request::Quit) => break,
                Ok(Request::Help) => {
                    writeln!(out, "{HELP}")?;
                    Ok(())
                }
                Ok(Request::List) => self.list(out),
                Ok(Request::Route { start, end }) => self.route(&start, &end, out),
                Err(message) => {
                    writeln!(out, "Error: {message}")?;
                    continue;
                }
            };

            match outcome {
                Ok(()) => {}
                Err(AppError::Io(e)) => return Err(AppError::Io(e)),
                Err(e) => {
                    tracing::warn!("Request failed: {e}");
                    writeln!(out, "Error: {e}")?;
                }
            }
            out.flush()?;
        }
        Ok(())
    }
}

/// Run the mode selected on the command line
pub fn run(settings: &Settings) -> Result<(), AppError> {
    let planner = Planner::new(settings, build_router(settings)?);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match settings.mode() {
        Some(Mode::Interactive) => planner.interactive(io::stdin().lock(), &mut out),
        Some(Mode::Route { start, end }) => planner.route(&start, &end, &mut out),
        Some(Mode::List) | None => planner.list(&mut out),
    }
}
