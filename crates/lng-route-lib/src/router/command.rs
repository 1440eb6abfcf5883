//! Routing through an external program
//!
//! The program receives one JSON request on stdin:
//!
//! ```json
//! {"origin": [-93.87, 29.74], "destination": [3.2, 51.33], "speed_knots": 15.0,
//!  "restrictions": ["northwest", "suez"]}
//! ```
//!
//! and must print a GeoJSON `Feature` with a `LineString` geometry on stdout. The
//! feature's properties carry `duration_hours` and `length` (with optional
//! `units`, kilometers by default), which is what common sea-routing packages
//! return.

use super::{MaritimeRouter, Passage, RouteRequest, RouteResponse, RoutingError};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a running child is checked for completion
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the external routing program
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRouterConfig {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments passed before the request is written to stdin
    pub args: Vec<String>,
    /// The child is killed when it runs longer than this (default 30s)
    pub timeout: Duration,
}

impl CommandRouterConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Routing backend that delegates to an external program
#[derive(Debug, Clone)]
pub struct CommandRouter {
    config: CommandRouterConfig,
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    origin: [f64; 2],
    destination: [f64; 2],
    speed_knots: f64,
    restrictions: Vec<&'a str>,
}

#[derive(Deserialize)]
struct FeatureResponse {
    geometry: LineGeometry,
    properties: FeatureProperties,
}

#[derive(Deserialize)]
struct LineGeometry {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct FeatureProperties {
    duration_hours: f64,
    length: f64,
    #[serde(default)]
    units: Option<String>,
}

impl CommandRouter {
    pub fn new(config: CommandRouterConfig) -> Self {
        Self { config }
    }

    fn encode_request(request: &RouteRequest) -> Result<Vec<u8>, RoutingError> {
        let body = CommandRequest {
            origin: [request.origin.x(), request.origin.y()],
            destination: [request.destination.x(), request.destination.y()],
            speed_knots: request.speed_knots,
            restrictions: request.restrictions.iter().map(Passage::as_str).collect(),
        };
        serde_json::to_vec(&body).map_err(|e| RoutingError::Backend {
            reason: format!("cannot encode request: {e}"),
        })
    }

    /// Wait for the child, killing it once the deadline passes or waiting fails
    fn wait_with_deadline(
        &self,
        child: &mut Child,
        deadline: Instant,
    ) -> Result<std::process::ExitStatus, RoutingError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RoutingError::Io(e));
                }
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Killing {} after {:?}",
                    self.config.program.display(),
                    self.config.timeout
                );
                // The child may exit between the check and the kill
                let _ = child.kill();
                let _ = child.wait();
                return Err(RoutingError::Timeout {
                    after: self.config.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Collect a drained pipe, giving up at the deadline
    ///
    /// A grandchild that inherited the pipe can keep it open after the child
    /// exits. Its reader thread is then left behind.
    fn join_with_deadline(
        &self,
        reader: JoinHandle<String>,
        deadline: Instant,
    ) -> Result<String, RoutingError> {
        while !reader.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Output of {} still open after {:?}",
                    self.config.program.display(),
                    self.config.timeout
                );
                return Err(RoutingError::Timeout {
                    after: self.config.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(reader.join().unwrap_or_default())
    }
}

/// Drain a child pipe on its own thread so a chatty child never blocks on a full pipe
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}

/// Convert a route length to kilometers
fn length_in_km(length: f64, units: Option<&str>) -> Result<f64, RoutingError> {
    match units.unwrap_or("km") {
        "km" => Ok(length),
        "m" => Ok(length / 1000.0),
        "mi" => Ok(length * 1.609344),
        "naut" | "nm" => Ok(length * 1.852),
        other => Err(RoutingError::InvalidResponse {
            reason: format!("unsupported length units {other:?}"),
        }),
    }
}

/// Parse the GeoJSON feature printed by the routing program
fn parse_response(stdout: &str) -> Result<RouteResponse, RoutingError> {
    let feature: FeatureResponse =
        serde_json::from_str(stdout).map_err(|e| RoutingError::InvalidResponse {
            reason: format!("expected a GeoJSON feature: {e}"),
        })?;

    let geometry = feature
        .geometry
        .coordinates
        .iter()
        .enumerate()
        .map(|(index, position)| match position.as_slice() {
            [lon, lat, ..] => Ok(Point::new(*lon, *lat)),
            _ => Err(RoutingError::InvalidResponse {
                reason: format!("position {index} has fewer than two coordinates"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let properties = feature.properties;
    Ok(RouteResponse {
        geometry,
        duration_hours: properties.duration_hours,
        length_km: length_in_km(properties.length, properties.units.as_deref())?,
    })
}

impl MaritimeRouter for CommandRouter {
    fn name(&self) -> &str {
        "command"
    }

    fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        let body = Self::encode_request(request)?;
        let deadline = Instant::now() + self.config.timeout;

        tracing::debug!(
            "Running {} {:?}",
            self.config.program.display(),
            self.config.args
        );
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without reading its input reports through its exit status
            if let Err(e) = stdin.write_all(&body) {
                tracing::debug!("Could not write request to router: {e}");
            }
        }

        let status = self.wait_with_deadline(&mut child, deadline)?;
        let stdout = self.join_with_deadline(stdout, deadline)?;
        let stderr = self.join_with_deadline(stderr, deadline)?;

        if !status.success() {
            let detail = stderr.trim();
            let reason = if detail.is_empty() {
                format!("{} exited with {status}", self.config.program.display())
            } else {
                format!(
                    "{} exited with {status}: {detail}",
                    self.config.program.display()
                )
            };
            // Routing packages signal unreachable destinations through a failing exit
            return Err(RoutingError::Backend { reason });
        }

        parse_response(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn request() -> RouteRequest {
        RouteRequest {
            origin: Point::new(-93.87, 29.74),
            destination: Point::new(3.2, 51.33),
            speed_knots: 15.0,
            restrictions: BTreeSet::from([Passage::Suez, Passage::Northwest]),
        }
    }

    #[test]
    fn test_encode_request() {
        let body = CommandRouter::encode_request(&request()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["origin"][0], -93.87);
        assert_eq!(json["origin"][1], 29.74);
        assert_eq!(json["speed_knots"], 15.0);
        assert_eq!(
            json["restrictions"],
            serde_json::json!(["suez", "northwest"])
        );
    }

    #[test]
    fn test_parse_feature() {
        let stdout = r#"{
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[-93.87, 29.74], [-80.0, 25.0, 0.0], [3.2, 51.33]]},
            "properties": {"duration_hours": 300.5, "length": 8900.2, "units": "km"}
        }"#;
        let response = parse_response(stdout).unwrap();
        assert_eq!(response.geometry.len(), 3);
        assert_eq!(response.geometry[1], Point::new(-80.0, 25.0));
        assert_eq!(response.duration_hours, 300.5);
        assert_eq!(response.length_km, 8900.2);
    }

    #[test]
    fn test_parse_converts_units() {
        let stdout = r#"{"geometry": {"coordinates": [[0, 0], [1, 1]]},
                         "properties": {"duration_hours": 1, "length": 100, "units": "naut"}}"#;
        let response = parse_response(stdout).unwrap();
        assert!((response.length_km - 185.2).abs() < 1e-9);

        let stdout = r#"{"geometry": {"coordinates": [[0, 0], [1, 1]]},
                         "properties": {"duration_hours": 1, "length": 100, "units": "deg"}}"#;
        assert!(matches!(
            parse_response(stdout),
            Err(RoutingError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_response("Traceback (most recent call last):"),
            Err(RoutingError::InvalidResponse { .. })
        ));
        let stdout = r#"{"geometry": {"coordinates": [[0], [1, 1]]},
                         "properties": {"duration_hours": 1, "length": 100}}"#;
        assert!(matches!(
            parse_response(stdout),
            Err(RoutingError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let router = CommandRouter::new(CommandRouterConfig::new(
            "/nonexistent/sea-route-helper",
        ));
        assert!(matches!(router.route(&request()), Err(RoutingError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_output_is_parsed() {
        let mut config = CommandRouterConfig::new("sh");
        config.args = vec![
            "-c".to_string(),
            r#"cat > /dev/null; echo '{"geometry":{"coordinates":[[-93.87,29.74],[3.2,51.33]]},"properties":{"duration_hours":250.0,"length":8000.0}}'"#.to_string(),
        ];
        let router = CommandRouter::new(config);
        let response = router.route(&request()).unwrap();
        assert_eq!(response.geometry.len(), 2);
        assert_eq!(response.length_km, 8000.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_reports_stderr() {
        let mut config = CommandRouterConfig::new("sh");
        config.args = vec![
            "-c".to_string(),
            "echo 'no path found' >&2; exit 3".to_string(),
        ];
        let router = CommandRouter::new(config);
        match router.route(&request()) {
            Err(RoutingError::Backend { reason }) => assert!(reason.contains("no path found")),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_hanging_program_is_killed() {
        let mut config = CommandRouterConfig::new("sh");
        config.args = vec!["-c".to_string(), "sleep 5".to_string()];
        config.timeout = Duration::from_millis(100);
        let router = CommandRouter::new(config);

        let started = Instant::now();
        let result = router.route(&request());
        assert!(matches!(result, Err(RoutingError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_inherited_pipe_does_not_outlive_deadline() {
        let mut config = CommandRouterConfig::new("sh");
        // The background sleep keeps stdout open after sh exits
        config.args = vec![
            "-c".to_string(),
            "sleep 5 & echo '{}'".to_string(),
        ];
        config.timeout = Duration::from_millis(300);
        let router = CommandRouter::new(config);

        let started = Instant::now();
        let result = router.route(&request());
        assert!(matches!(result, Err(RoutingError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
