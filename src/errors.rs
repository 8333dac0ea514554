use failure::Fail;

pub type Result<T> = ::std::result::Result<T, failure::Error>;

/// The ways a single resource load could end up `Failed`.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Schema '{}' has not been mounted.", _0)]
    MountNotFound(String),
    #[fail(display = "Could not find loader for extension '{}'.", _0)]
    LoaderNotFound(String),
    #[fail(display = "Resource {} is not found.", _0)]
    NotFound(String),
    #[fail(display = "Resource {} is malformed: {}", _0, _1)]
    Malformed(String, failure::Error),
    #[fail(display = "{}", _0)]
    IO(::std::io::Error),
}

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Self {
        Error::IO(err)
    }
}
