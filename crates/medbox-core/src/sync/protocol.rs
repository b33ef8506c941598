//! Remote protocol: action tags, query encoding and reply parsing.

use alloc::string::String;
use core::fmt::Write;

use serde_json::Value;

use super::SyncError;
use crate::{alarm::AlarmConfig, storage::UserId};

pub const SUCCESS_STATUS: &str = "success";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Bind,
    GetConfig,
    Eat,
    NotifyAlarm,
}

impl Action {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::GetConfig => "get_config",
            Self::Eat => "eat",
            Self::NotifyAlarm => "notify_alarm",
        }
    }
}

/// Parse a response body. Anything that is not JSON reads as no data.
pub fn parse_reply(body: &[u8]) -> Option<Value> {
    serde_json::from_slice(body).ok()
}

pub fn is_success(reply: &Value) -> bool {
    reply.get("status").and_then(Value::as_str) == Some(SUCCESS_STATUS)
}

fn successful(reply: Option<&Value>) -> Result<&Value, SyncError> {
    let reply = reply.ok_or(SyncError::Malformed)?;
    if !is_success(reply) {
        return Err(SyncError::Rejected);
    }
    Ok(reply)
}

pub fn parse_bind(reply: Option<&Value>) -> Result<UserId, SyncError> {
    let reply = successful(reply)?;
    let user_id = match reply.get("userId") {
        Some(Value::String(user_id)) => user_id.as_str(),
        _ => return Err(SyncError::Malformed),
    };
    if user_id.is_empty() {
        return Err(SyncError::Malformed);
    }
    UserId::try_from(user_id).map_err(|_| SyncError::Malformed)
}

/// Alarm fields pulled from the remote service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConfigUpdate {
    pub hour: u8,
    pub minute: u8,
    /// `None` when the reply carried no usable day list.
    pub days: Option<[bool; 7]>,
}

impl ConfigUpdate {
    /// Merge into `current`; a pulled config always enables the alarm.
    pub fn apply_to(&self, current: AlarmConfig) -> AlarmConfig {
        let days = self.days.unwrap_or(current.days());
        AlarmConfig::new(self.hour, self.minute, days, true).unwrap_or(current)
    }
}

pub fn parse_config(reply: Option<&Value>) -> Result<ConfigUpdate, SyncError> {
    let reply = successful(reply)?;
    let hour = parse_field(reply, "hour", 23)?;
    let minute = parse_field(reply, "minute", 59)?;

    Ok(ConfigUpdate {
        hour,
        minute,
        days: parse_days(reply.get("days")),
    })
}

fn parse_field(reply: &Value, field: &'static str, max: u8) -> Result<u8, SyncError> {
    let value = match reply.get(field) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    value
        .filter(|value| (0..=i64::from(max)).contains(value))
        .map(|value| value as u8)
        .ok_or(SyncError::Validation { field })
}

fn parse_days(days: Option<&Value>) -> Option<[bool; 7]> {
    let list = days?.as_array()?;
    if list.len() != 7 {
        return None;
    }

    let mut parsed = [false; 7];
    for (slot, value) in parsed.iter_mut().zip(list) {
        *slot = value.as_bool()?;
    }
    Some(parsed)
}

/// Percent-encode `params` as `k=v&k=v`.
pub fn encode_query(params: &[(&str, &str)]) -> String {
    let mut query = String::new();
    for (index, (key, value)) in params.iter().enumerate() {
        if index > 0 {
            query.push('&');
        }
        push_encoded(&mut query, key);
        query.push('=');
        push_encoded(&mut query, value);
    }
    query
}

fn push_encoded(out: &mut String, text: &str) {
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
}

/// Parts of a plain `http://host[:port]/path` endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl<'a> Endpoint<'a> {
    pub fn parse(url: &'a str) -> Option<Self> {
        let rest = url.strip_prefix("http://")?;
        let (authority, path) = match rest.find('/') {
            Some(split) => rest.split_at(split),
            None => (rest, "/"),
        };
        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (host, port.parse().ok()?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self { host, port, path })
    }

    /// One-shot `GET` with the query appended; the connection closes after
    /// the reply.
    pub fn get_request(&self, query: &str) -> String {
        let mut request = String::new();
        let separator = if self.path.contains('?') { '&' } else { '?' };
        let _ = write!(request, "GET {}", self.path);
        if !query.is_empty() {
            request.push(separator);
            request.push_str(query);
        }
        let _ = write!(
            request,
            " HTTP/1.0\r\nHost: {}\r\nConnection: close\r\nUser-Agent: medbox\r\n\r\n",
            self.host
        );
        request
    }
}

/// Status code and body of a complete HTTP/1.x response.
pub fn split_response(raw: &[u8]) -> Option<(u16, &[u8])> {
    let header_end = raw.windows(4).position(|w| w == b"\r\n\r\n")?;
    let status_line = raw[..header_end].split(|b| *b == b'\r').next()?;
    let status_line = core::str::from_utf8(status_line).ok()?;

    let mut parts = status_line.split(' ');
    if !parts.next()?.starts_with("HTTP/1.") {
        return None;
    }
    let status = parts.next()?.parse().ok()?;
    Some((status, &raw[header_end + 4..]))
}
