pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    AlreadyExists(String),
    NotFound(String),
    LinkCountMismatch(String),
    InvalidArgument(String),
    InvalidTimestamp(i64, i64),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl Error {
    /// Whether this error stands for an absent backing path.
    pub fn is_absent(&self) -> bool {
        match *self {
            Error::NotFound(_) => true,
            Error::IoError(ref err) => is_absent_io(err),
            _ => false,
        }
    }
}

pub(crate) fn is_absent_io(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ENOTDIR)
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::AlreadyExists(ref name) => write!(f, "Item with the same name already exists: {name}"),
            Error::NotFound(ref name) => write!(f, "Item does not exist in directory: {name}"),
            Error::LinkCountMismatch(ref name) => {
                write!(f, "Link count of {name} no longer matches its attachment")
            }
            Error::InvalidArgument(ref msg) => write!(f, "Invalid argument: {msg}"),
            Error::InvalidTimestamp(sec, nsec) => write!(f, "Timestamp out of range: {sec}s {nsec}ns"),
            Error::IoError(ref err) => write!(f, "{err}"),
            Error::JsonError(ref err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::JsonError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::IoError(error)
    }
}

impl std::convert::From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::JsonError(error)
    }
}
