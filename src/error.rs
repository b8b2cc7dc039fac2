use std::error;
use std::fmt;
use std::io;

/// Numeric status code, as returned by the C API. `0` means no error.
///
/// The values are stable and index [`ErrorCode::as_str`]'s description table.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ErrorCode(pub u32);

/// Reasons an operation can fail. Discriminants match [`ErrorCode`].
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    /// The source file doesn't exist or can't be opened
    NotFound = 1,
    /// The destination file can't be created
    FileCreationFailure = 2,
    OutOfMemory = 3,
    /// The data doesn't start with the PNG signature
    InvalidSignature = 4,
    /// The codec gave up in the middle of the stream (corrupt or truncated data, unsupported layout)
    CodecFault = 5,
    /// A required pointer was null (C API only)
    NullArgument = 6,
    /// Buffer bit depth must be 8 or 16
    InvalidDepth = 7,
    /// Buffer color type can't be a palette
    InvalidColor = 8,
    /// Zero, mismatched or overflowing width/height/stride
    InvalidDimensions = 9,
}

// NUL-terminated, so that the C API can hand out pointers to them.
static DESCRIPTIONS: [&str; ErrorCode::COUNT] = [
    "no error has occurred\0",
    "file not found at path\0",
    "failed to create file\0",
    "out of memory\0",
    "invalid file signature\0",
    "codec reported an internal error\0",
    "NULL argument\0",
    "invalid bit depth\0",
    "invalid color type\0",
    "invalid pixel dimensions\0",
];

impl ErrorCode {
    pub const NONE: ErrorCode = ErrorCode(0);
    /// Number of codes, including `NONE`
    pub const COUNT: usize = 10;

    /// Returns an English description of the numerical error code.
    pub fn as_str(&self) -> &'static str {
        let s = self.c_description();
        // safe: the table is ASCII and the trailing NUL is a single byte
        std::str::from_utf8(&s[..s.len() - 1]).unwrap_or("unknown error code")
    }

    /// Description with a trailing NUL
    pub(crate) fn c_description(&self) -> &'static [u8] {
        match DESCRIPTIONS.get(self.0 as usize) {
            Some(s) => s.as_bytes(),
            None => b"unknown error code\0",
        }
    }

    /// Helper function for the library
    pub fn to_result(self) -> Result<(), Error> {
        match Error::from_code(self.0) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl Error {
    #[inline]
    pub fn code(&self) -> ErrorCode {
        ErrorCode(*self as u32)
    }

    /// Returns an English description of the error.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.code().as_str()
    }

    /// `None` for `0` and for codes outside the table
    pub fn from_code(code: u32) -> Option<Error> {
        Some(match code {
            1 => Error::NotFound,
            2 => Error::FileCreationFailure,
            3 => Error::OutOfMemory,
            4 => Error::InvalidSignature,
            5 => Error::CodecFault,
            6 => Error::NullArgument,
            7 => Error::InvalidDepth,
            8 => Error::InvalidColor,
            9 => Error::InvalidDimensions,
            _ => return None,
        })
    }
}

/// English description of a numeric code, `ERROR_DESCRIPTIONS[code]` in C terms.
pub fn error_text(code: ErrorCode) -> &'static str {
    code.as_str()
}

impl From<Error> for ErrorCode {
    #[inline(always)]
    fn from(err: Error) -> ErrorCode {
        err.code()
    }
}

impl From<Result<(), Error>> for ErrorCode {
    fn from(res: Result<(), Error>) -> ErrorCode {
        match res {
            Ok(()) => ErrorCode::NONE,
            Err(err) => err.code(),
        }
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl error::Error for Error {}

#[doc(hidden)]
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => Error::NotFound,
            io::ErrorKind::OutOfMemory => Error::OutOfMemory,
            _ => Error::CodecFault,
        }
    }
}

#[doc(hidden)]
impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Error {
        match err {
            png::DecodingError::IoError(e) => Error::from(e),
            png::DecodingError::LimitsExceeded => Error::OutOfMemory,
            _ => Error::CodecFault,
        }
    }
}

#[doc(hidden)]
impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Error {
        match err {
            png::EncodingError::LimitsExceeded => Error::OutOfMemory,
            // the file exists at this point, so any failure is the stream's
            _ => Error::CodecFault,
        }
    }
}

impl From<fallible_collections::TryReserveError> for Error {
    #[cold]
    fn from(_: fallible_collections::TryReserveError) -> Error {
        Error::OutOfMemory
    }
}

#[test]
fn descriptions_are_indexed_by_code() {
    assert_eq!("no error has occurred", ErrorCode::NONE.as_str());
    assert_eq!("invalid bit depth", Error::InvalidDepth.as_str());
    assert_eq!("invalid pixel dimensions", error_text(ErrorCode(9)));
    assert_eq!("unknown error code", ErrorCode(10).as_str());
    for code in 1..ErrorCode::COUNT as u32 {
        let err = Error::from_code(code).unwrap();
        assert_eq!(code, err.code().0);
        assert_eq!(Err(err), ErrorCode(code).to_result());
    }
    assert_eq!(Ok(()), ErrorCode::NONE.to_result());
    assert!(Error::from_code(10).is_none());
}

#[test]
fn io_errors() {
    assert_eq!(Error::NotFound, Error::from(io::Error::from(io::ErrorKind::NotFound)));
    assert_eq!(Error::CodecFault, Error::from(io::Error::from(io::ErrorKind::UnexpectedEof)));
}
