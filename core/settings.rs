// Transport settings read from environment variables
// SOCKIO_RECV_BUFFER_SIZE: size of the reusable receive scratch buffer (default: 64)
use std::env;

pub const DEFAULT_RECV_BUFFER_SIZE: usize = 64;

const ENV_RECV_BUFFER_SIZE: &str = "SOCKIO_RECV_BUFFER_SIZE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub recv_buffer_size: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl TransportSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Missing, unparsable
    /// or zero values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let recv_buffer_size = lookup(ENV_RECV_BUFFER_SIZE)
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_RECV_BUFFER_SIZE);

        TransportSettings { recv_buffer_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_buffer_size() {
        let settings = TransportSettings::from_lookup(|key| {
            (key == "SOCKIO_RECV_BUFFER_SIZE").then(|| "4096".to_string())
        });
        assert_eq!(settings.recv_buffer_size, 4096);
    }

    #[test]
    fn bad_values_fall_back_to_default() {
        for raw in ["", "zero", "0", "-1"] {
            let settings = TransportSettings::from_lookup(|_| Some(raw.to_string()));
            assert_eq!(settings, TransportSettings::default(), "value {:?}", raw);
        }
        assert_eq!(TransportSettings::from_lookup(|_| None), TransportSettings::default());
    }
}
