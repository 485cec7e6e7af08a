//! Driver option strings: `name[:param[,param...]]`.
//!
//! Each param is either a bare flag (`fullscreen`) or `key=value`.

use std::fmt;

/// Upper bound on parameters in one driver string.
pub const MAX_PARAMS: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("driver name is empty")]
    EmptyName,
    #[error("driver parameter {index} is empty")]
    EmptyParam { index: usize },
    #[error("too many driver parameters (at most {max})")]
    TooManyParams { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverParam {
    Flag(String),
    Pair { key: String, value: String },
}

impl DriverParam {
    fn parse(token: &str, index: usize) -> Result<Self, OptionError> {
        let token = token.trim();
        match token.split_once('=') {
            _ if token.is_empty() => Err(OptionError::EmptyParam { index }),
            Some((key, _)) if key.trim().is_empty() => Err(OptionError::EmptyParam { index }),
            Some((key, value)) => Ok(Self::Pair {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            None => Ok(Self::Flag(token.to_string())),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Flag(name) => name,
            Self::Pair { key, .. } => key,
        }
    }

    /// Value of a pair; flags have the empty value.
    pub fn value(&self) -> &str {
        match self {
            Self::Flag(_) => "",
            Self::Pair { value, .. } => value,
        }
    }
}

impl fmt::Display for DriverParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(name) => f.write_str(name),
            Self::Pair { key, value } => write!(f, "{key}={value}"),
        }
    }
}

/// Ordered parameters handed to a driver's `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverParams(Vec<DriverParam>);

impl DriverParams {
    pub fn new(params: Vec<DriverParam>) -> Result<Self, OptionError> {
        if params.len() > MAX_PARAMS {
            return Err(OptionError::TooManyParams { max: MAX_PARAMS });
        }
        Ok(Self(params))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriverParam> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First parameter named `name`. A flag yields `""`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|p| p.key() == name).map(DriverParam::value)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Integer parameter, or `default` when absent or not a number.
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.get(name) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(param = name, value = raw, default, "driver parameter is not a number");
                default
            }),
        }
    }
}

/// A parsed driver string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRequest {
    pub name: String,
    pub params: DriverParams,
}

impl DriverRequest {
    /// Parse a driver string. Empty input means "pick by priority" and
    /// yields `None`.
    pub fn parse(input: &str) -> Result<Option<Self>, OptionError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match input.split_once(':') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (input, None),
        };
        if name.is_empty() {
            return Err(OptionError::EmptyName);
        }

        let params = match rest.filter(|r| !r.trim().is_empty()) {
            None => Vec::new(),
            Some(rest) => {
                if rest.split(',').count() > MAX_PARAMS {
                    return Err(OptionError::TooManyParams { max: MAX_PARAMS });
                }
                rest.split(',')
                    .enumerate()
                    .map(|(index, token)| DriverParam::parse(token, index))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(Some(Self {
            name: name.to_string(),
            params: DriverParams::new(params)?,
        }))
    }
}

impl fmt::Display for DriverRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            f.write_str(if i == 0 { ":" } else { "," })?;
            write!(f, "{param}")?;
        }
        Ok(())
    }
}
