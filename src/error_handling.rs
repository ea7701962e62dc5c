use std::path::PathBuf;
use std::fmt::{Debug, Display};

pub trait ErrorType: Display + Debug + PartialEq {}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Location {
    pub file: Option<PathBuf>,
    pub line: usize,
    pub column: usize
}

impl Location {
    // A position inside a token stream, with no file attached
    pub fn at(line: usize, column: usize) -> Self {
        Location { file: None, line, column }
    }

    pub fn in_file(file: PathBuf, line: usize) -> Self {
        Location { file: Some(file), line, column: 0 }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
            if self.line == 0 {
                return Ok(());
            }
            write!(f, ":")?;
        }

        if self.column == 0 {
            write!(f, "{}", self.line)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T
}

impl<T: ErrorType> Error<T> {
    pub fn new(error: T, location: Location) -> Self {
        Error { location, error }
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn column(&self) -> usize {
        self.location.column
    }
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\x1b[31;49;1m[{}]\x1b[39;49;1m  {}\x1b[0m", self.location, self.error)
    }
}

impl<T: ErrorType> std::error::Error for Error<T> {}

pub type Errors<T> = Vec<Error<T>>;
