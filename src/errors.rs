use std::error::Error;
use std::fmt::{Debug, Display};

/// The closed set of failure categories surfaced by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A mandatory connection field is missing, or a required handle was not supplied.
    Configuration,
    /// A file, the environment or a vault could not supply the required values.
    Resolution,
    /// The ingest request failed or Snowpipe did not accept the files.
    Ingestion,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::Ingestion => "IngestionError",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct SnowpipeError {
    kind: ErrorKind,
    trace: String,
    message: String,
    underlying_error: Option<String>,
}

impl SnowpipeError {
    pub(crate) fn new(
        kind: ErrorKind,
        trace: String,
        message: String,
        underlying: Option<String>,
    ) -> Self {
        Self {
            kind,
            trace,
            message,
            underlying_error: underlying,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Re-labels the error under a different kind. The message, trace and
    /// underlying error name are kept.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Error for SnowpipeError {}

impl Display for SnowpipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.underlying_error.as_deref() {
            Some(underlying) => write!(
                f,
                "[{}: {}] ({}): {}",
                self.kind, underlying, self.trace, self.message
            ),
            None => write!(f, "[{}] ({}): {}", self.kind, self.trace, self.message),
        }
    }
}

impl Debug for SnowpipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

macro_rules! this_errors {
    ($kind:ident, $msg:literal, $val:expr) => {
        $val.map_err(|e| $crate::error!($kind, $msg, e))?
    };
}

macro_rules! error {
    ($kind:ident, $val:literal) => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let fun_name = &name[..name.len() - 3];
        $crate::errors::SnowpipeError::new(
            $crate::errors::ErrorKind::$kind,
            fun_name.into(),
            $val.into(),
            None,
        )
    }};
    ($kind:ident, message = $msg:expr) => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let fun_name = &name[..name.len() - 3];
        $crate::errors::SnowpipeError::new(
            $crate::errors::ErrorKind::$kind,
            fun_name.into(),
            ($msg).to_string(),
            None,
        )
    }};
    ($kind:ident, $err:expr) => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let err = $err;
        let name = type_name_of(f);
        let error_type_name = type_name_of(&err);
        let fun_name = &name[..name.len() - 3];
        let error_name = error_type_name.split("::").last().map(|x| x.to_string());
        let error_msg = format!("{}", err);

        $crate::errors::SnowpipeError::new(
            $crate::errors::ErrorKind::$kind,
            fun_name.into(),
            error_msg,
            error_name,
        )
    }};
    ($kind:ident, $val:literal, $err:expr) => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let err = $err;
        let name = type_name_of(f);
        let error_type_name = type_name_of(&err);
        let fun_name = &name[..name.len() - 3];
        let error_name = error_type_name.split("::").last().map(|x| x.to_string());
        let final_msg = format!("{} - {}", $val, err);
        $crate::errors::SnowpipeError::new(
            $crate::errors::ErrorKind::$kind,
            fun_name.into(),
            final_msg,
            error_name,
        )
    }};
}

pub(crate) use error;
pub(crate) use this_errors;
