//! Printing terminals and routes

use crate::settings::OutputFormat;
use lng_route_lib::{MapScene, Route, Terminal};
use std::io::{self, Write};

/// Print the visible terminals
pub fn write_terminals<W: Write>(
    out: &mut W,
    terminals: &[&Terminal],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for terminal in terminals {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{} Mtpa\t({:.4}, {:.4})",
                    terminal.name(),
                    terminal.facility_type(),
                    terminal.status(),
                    terminal.parent(),
                    terminal.capacity_mtpa(),
                    terminal.latitude(),
                    terminal.longitude()
                )?;
            }
            writeln!(out, "{} terminal(s)", terminals.len())
        }
        OutputFormat::Json => {
            write_json(out, &MapScene::build(terminals.iter().copied(), None))
        }
    }
}

/// Print a computed route, with the visible terminals as map context in JSON
pub fn write_route<W: Write>(
    out: &mut W,
    route: &Route,
    terminals: &[&Terminal],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            let avoiding = route
                .restrictions()
                .iter()
                .map(|passage| passage.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "{} -> {}", route.start(), route.end())?;
            writeln!(out, "  duration:  {} days", route.duration_days())?;
            writeln!(out, "  length:    {} km", route.length_km_rounded())?;
            writeln!(out, "  speed:     {} kn", route.speed_knots())?;
            writeln!(out, "  avoiding:  {avoiding}")?;
            writeln!(out, "  waypoints: {}", route.geometry().len())
        }
        OutputFormat::Json => write_json(
            out,
            &MapScene::build(terminals.iter().copied(), Some(route)),
        ),
    }
}

fn write_json<W: Write>(out: &mut W, scene: &MapScene) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, scene)?;
    writeln!(out)
}
