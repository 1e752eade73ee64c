// Socket option model: names, untyped values, typed options and snapshots
use crate::error::{IoError, Result};
use crate::types::AddressKind;

pub const OPTION_TCP_KEEPALIVE: &str = "tcp_keepalive";
pub const OPTION_TCP_KEEPALIVE_TIME: &str = "tcp_keepalive_time";
pub const OPTION_ADDRESS_KIND: &str = "address_kind";

/// Untyped option value as handed over by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

/// A recognized option with a validated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketOption {
    KeepAlive(bool),
    /// Idle time in seconds before the first keepalive packet.
    KeepAliveTime(u32),
    AddressKind(AddressKind),
}

impl SocketOption {
    pub fn parse(name: &str, value: &OptionValue) -> Result<Self> {
        match name {
            OPTION_TCP_KEEPALIVE => match value {
                OptionValue::Bool(on) => Ok(SocketOption::KeepAlive(*on)),
                // int semantics: anything non-zero turns keepalive on
                OptionValue::Int(v) => Ok(SocketOption::KeepAlive(*v != 0)),
                OptionValue::Str(_) => Err(IoError::InvalidOptionValue(OPTION_TCP_KEEPALIVE)),
            },
            OPTION_TCP_KEEPALIVE_TIME => match value {
                OptionValue::Int(v) => u32::try_from(*v)
                    .map(SocketOption::KeepAliveTime)
                    .map_err(|_| IoError::InvalidOptionValue(OPTION_TCP_KEEPALIVE_TIME)),
                _ => Err(IoError::InvalidOptionValue(OPTION_TCP_KEEPALIVE_TIME)),
            },
            OPTION_ADDRESS_KIND => match value {
                OptionValue::Str(s) => AddressKind::from_name(s)
                    .map(SocketOption::AddressKind)
                    .ok_or(IoError::InvalidOptionValue(OPTION_ADDRESS_KIND)),
                _ => Err(IoError::InvalidOptionValue(OPTION_ADDRESS_KIND)),
            },
            other => Err(IoError::UnknownOption(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SocketOption::KeepAlive(_) => OPTION_TCP_KEEPALIVE,
            SocketOption::KeepAliveTime(_) => OPTION_TCP_KEEPALIVE_TIME,
            SocketOption::AddressKind(_) => OPTION_ADDRESS_KIND,
        }
    }

    pub fn value(&self) -> OptionValue {
        match self {
            SocketOption::KeepAlive(on) => OptionValue::Bool(*on),
            SocketOption::KeepAliveTime(secs) => OptionValue::Int(i64::from(*secs)),
            SocketOption::AddressKind(kind) => OptionValue::Str(kind.as_str().to_string()),
        }
    }
}

/// Options captured from a transport, replayable onto a fresh instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSnapshot {
    options: Vec<SocketOption>,
}

impl OptionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an option, replacing an earlier value for the same name.
    pub fn record(&mut self, option: SocketOption) {
        match self.options.iter_mut().find(|o| o.name() == option.name()) {
            Some(slot) => *slot = option,
            None => self.options.push(option),
        }
    }

    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.options
            .iter()
            .find(|o| o.name() == name)
            .map(SocketOption::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SocketOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_accepts_bool_and_int() {
        assert_eq!(
            SocketOption::parse(OPTION_TCP_KEEPALIVE, &OptionValue::Int(1)).unwrap(),
            SocketOption::KeepAlive(true)
        );
        assert_eq!(
            SocketOption::parse(OPTION_TCP_KEEPALIVE, &OptionValue::Int(0)).unwrap(),
            SocketOption::KeepAlive(false)
        );
        assert_eq!(
            SocketOption::parse(OPTION_TCP_KEEPALIVE, &false.into()).unwrap(),
            SocketOption::KeepAlive(false)
        );
    }

    #[test]
    fn keepalive_time_rejects_negative_and_strings() {
        assert!(matches!(
            SocketOption::parse(OPTION_TCP_KEEPALIVE_TIME, &OptionValue::Int(-5)),
            Err(IoError::InvalidOptionValue(OPTION_TCP_KEEPALIVE_TIME))
        ));
        assert!(SocketOption::parse(OPTION_TCP_KEEPALIVE_TIME, &"30".into()).is_err());
        assert_eq!(
            SocketOption::parse(OPTION_TCP_KEEPALIVE_TIME, &OptionValue::Int(30)).unwrap(),
            SocketOption::KeepAliveTime(30)
        );
    }

    #[test]
    fn address_kind_parses_known_names_only() {
        assert_eq!(
            SocketOption::parse(OPTION_ADDRESS_KIND, &"domain_socket".into()).unwrap(),
            SocketOption::AddressKind(AddressKind::DomainSocket)
        );
        assert!(matches!(
            SocketOption::parse(OPTION_ADDRESS_KIND, &"bluetooth".into()),
            Err(IoError::InvalidOptionValue(OPTION_ADDRESS_KIND))
        ));
    }

    #[test]
    fn unknown_option_fails() {
        match SocketOption::parse("tcp_nodelay", &OptionValue::Int(1)) {
            Err(IoError::UnknownOption(name)) => assert_eq!(name, "tcp_nodelay"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn snapshot_keeps_latest_value_per_name() {
        let mut snapshot = OptionSnapshot::new();
        snapshot.record(SocketOption::KeepAlive(true));
        snapshot.record(SocketOption::KeepAliveTime(10));
        snapshot.record(SocketOption::KeepAlive(false));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(OPTION_TCP_KEEPALIVE), Some(OptionValue::Bool(false)));
        assert_eq!(snapshot.get(OPTION_TCP_KEEPALIVE_TIME), Some(OptionValue::Int(10)));
        assert_eq!(snapshot.get(OPTION_ADDRESS_KIND), None);
    }
}
