use crate::error::{PassError, Result};

use serde::{Deserialize, Serialize};

/// Separator between the origin and destination in a `route` value.
const ROUTE_SEPARATOR: &str = " to ";

/// The JSON payload accepted by the generate endpoint.
///
/// Every field is optional at the serde level so that a missing required
/// field can be reported as a validation error rather than a decode error.
/// Clients send numbers for things like gates and bags, so each field takes
/// any JSON scalar.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassRequest {
  pub passenger: Option<Scalar>,
  pub flight: Option<Scalar>,
  pub seat: Option<Scalar>,
  pub airline: Option<Scalar>,
  pub route: Option<Scalar>,
  pub gate: Option<Scalar>,
  pub terminal: Option<Scalar>,
  pub bags: Option<Scalar>,
  pub bp_number: Option<Scalar>,
  pub departure: Option<Scalar>,
}

/// A JSON scalar, printed the way it was sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Bool(bool),
  Int(i64),
  UInt(u64),
  Float(f64),
  Text(String),
}

impl std::fmt::Display for Scalar {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Scalar::Bool(b) => write!(f, "{b}"),
      Scalar::Int(n) => write!(f, "{n}"),
      Scalar::UInt(n) => write!(f, "{n}"),
      Scalar::Float(n) => write!(f, "{n}"),
      Scalar::Text(s) => f.write_str(s),
    }
  }
}

/// A validated request: the three required fields are guaranteed present.
#[derive(Debug, Clone)]
pub struct BoardingPass {
  pub passenger: String,
  pub flight: String,
  pub seat: String,
  pub airline: Option<String>,
  pub route: Option<String>,
  pub gate: Option<String>,
  pub terminal: Option<String>,
  pub bags: Option<String>,
  pub bp_number: Option<String>,
  pub departure: Option<String>,
}

/// The flat set of tokens substituted into templates and drawn onto images.
///
/// Absent optional fields are represented by empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassView {
  pub passenger: String,
  pub flight: String,
  pub seat: String,
  pub airline: String,
  pub gate: String,
  pub terminal: String,
  pub bags: String,
  pub bp_number: String,
  pub departure: String,
  pub departure_date: String,
  pub departure_time: String,
  pub route: String,
  pub from_city: String,
  pub to_city: String,
  pub from_code: String,
  pub to_code: String,
}

impl PassRequest {
  /// Checks that passenger, flight and seat are present and non-blank.
  pub fn validate(self) -> Result<BoardingPass> {
    let mut missing = Vec::new();
    let passenger = required(self.passenger, "passenger", &mut missing);
    let flight = required(self.flight, "flight", &mut missing);
    let seat = required(self.seat, "seat", &mut missing);

    match (passenger, flight, seat) {
      (Some(passenger), Some(flight), Some(seat)) => Ok(BoardingPass {
        passenger,
        flight,
        seat,
        airline: text(self.airline),
        route: text(self.route),
        gate: text(self.gate),
        terminal: text(self.terminal),
        bags: text(self.bags),
        bp_number: text(self.bp_number),
        departure: text(self.departure),
      }),
      _ => Err(PassError::MissingFields(missing)),
    }
  }
}

fn text(value: Option<Scalar>) -> Option<String> {
  value.map(|v| v.to_string())
}

fn required(value: Option<Scalar>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
  match text(value) {
    Some(v) if !v.trim().is_empty() => Some(v),
    _ => {
      missing.push(name);
      None
    }
  }
}

impl BoardingPass {
  /// Derives the template tokens for this pass.
  pub fn view(&self) -> PassView {
    let route = self.route.clone().unwrap_or_default();
    let (from_city, to_city) = split_route(&route);
    let departure = self.departure.clone().unwrap_or_default();
    let (departure_date, departure_time) = split_departure(&departure);

    PassView {
      passenger: self.passenger.clone(),
      flight: self.flight.clone(),
      seat: self.seat.clone(),
      airline: self.airline.clone().unwrap_or_default(),
      gate: self.gate.clone().unwrap_or_default(),
      terminal: self.terminal.clone().unwrap_or_default(),
      bags: self.bags.clone().unwrap_or_default(),
      bp_number: self.bp_number.clone().unwrap_or_default(),
      from_code: airport_code(&from_city),
      to_code: airport_code(&to_city),
      from_city,
      to_city,
      departure_date,
      departure_time,
      departure,
      route,
    }
  }

  /// The file name (without extension) under which the rendered pass is stored.
  ///
  /// Whitespace is stripped from flight and passenger, and the result is
  /// sanitised so it can never escape the output directory.
  pub fn file_stem(&self) -> String {
    let stem = format!("{}-{}", strip_whitespace(&self.flight), strip_whitespace(&self.passenger));
    sanitize_filename::sanitize(stem)
  }
}

fn strip_whitespace(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Splits `"Paris to New York"` into `("Paris", "New York")`.
pub fn split_route(route: &str) -> (String, String) {
  match route.split_once(ROUTE_SEPARATOR) {
    Some((from, to)) => (from.trim().to_string(), to.trim().to_string()),
    None => (route.trim().to_string(), String::new()),
  }
}

/// Splits `"2024-05-01 14:30"` into `("2024-05-01", "14:30")`.
pub fn split_departure(departure: &str) -> (String, String) {
  let departure = departure.trim();
  match departure.split_once(' ') {
    Some((date, time)) => (date.to_string(), time.trim().to_string()),
    None => (departure.to_string(), String::new()),
  }
}

/// The first three characters of a city name, upper-cased.
pub fn airport_code(city: &str) -> String {
  city.trim().chars().take(3).flat_map(char::to_uppercase).collect()
}
