//! Errors for Keel.

use std::fmt;

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be returned from the kernel or the layers built on it.
#[derive(Debug, Clone)]
pub struct Error(Box<ErrorImpl>);

#[derive(Debug, Clone)]
pub struct ErrorImpl {
    pub kind: ErrorKind,
    pub msg: ErrorMsg,
    pub source: Option<Error>,
}

/// The broad class an error belongs to.
///
/// Combinators use this to tell "the step did not apply, try the next one"
/// apart from a genuinely broken invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A primitive rule's precondition was violated.
    Kernel,
    /// A tactic or rule did not apply to its input. Recoverable.
    NoApply,
    /// A definition or input was malformed beyond repair.
    Malformed,
    /// The recursion classifier did not recognize the shape. Recoverable.
    NotAdmissible,
    /// Proof search ran out of its resource budget. The payload is the
    /// last bound tried; retry with a larger one. This is never a disproof.
    SearchExhausted(usize),
}

/// An error message.
#[derive(Debug, Clone)]
pub enum ErrorMsg {
    EStatic(&'static str),
    EDyn(String),
}

mod impls {
    use super::*;

    impl std::ops::Deref for Error {
        type Target = ErrorImpl;
        fn deref(&self) -> &Self::Target {
            &*self.0
        }
    }

    impl fmt::Display for Error {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            match &self.msg {
                ErrorMsg::EStatic(msg) => write!(out, "{}", msg)?,
                ErrorMsg::EDyn(s) => write!(out, "{}", &s)?,
            }
            if let ErrorKind::SearchExhausted(n) = self.kind {
                write!(out, " (bound reached: {})", n)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for Error {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match &self.source {
                None => None,
                Some(p) => Some(&*p),
            }
        }
    }
}

impl Error {
    fn mk_(kind: ErrorKind, msg: ErrorMsg) -> Self {
        Error(Box::new(ErrorImpl {
            kind,
            msg,
            source: None,
        }))
    }

    /// Build a new kernel error.
    pub fn new(msg: &'static str) -> Self {
        Self::mk_(ErrorKind::Kernel, ErrorMsg::EStatic(msg))
    }

    pub fn new_string(msg: String) -> Self {
        Self::mk_(ErrorKind::Kernel, ErrorMsg::EDyn(msg))
    }

    /// A recoverable "did not apply" failure.
    pub fn no_apply(msg: &'static str) -> Self {
        Self::mk_(ErrorKind::NoApply, ErrorMsg::EStatic(msg))
    }

    pub fn no_apply_string(msg: String) -> Self {
        Self::mk_(ErrorKind::NoApply, ErrorMsg::EDyn(msg))
    }

    /// A hard error: the input itself is broken.
    pub fn malformed(msg: &'static str) -> Self {
        Self::mk_(ErrorKind::Malformed, ErrorMsg::EStatic(msg))
    }

    pub fn malformed_string(msg: String) -> Self {
        Self::mk_(ErrorKind::Malformed, ErrorMsg::EDyn(msg))
    }

    /// The recursion classifier gave up on this shape.
    pub fn not_admissible(msg: String) -> Self {
        Self::mk_(ErrorKind::NotAdmissible, ErrorMsg::EDyn(msg))
    }

    /// Search gave up after exhausting the bound `n`.
    pub fn exhausted(n: usize) -> Self {
        Self::mk_(
            ErrorKind::SearchExhausted(n),
            ErrorMsg::EStatic("proof search exhausted its budget"),
        )
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    /// Is this a failure a combinator may recover from by trying
    /// an alternative?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.0.kind,
            ErrorKind::NoApply | ErrorKind::NotAdmissible | ErrorKind::SearchExhausted(_)
        )
    }

    /// Change the source of this error.
    pub fn set_source(&mut self, src: Self) {
        // append at the end of the `source` linked list.
        if let Some(e2) = &mut self.0.source {
            e2.set_source(src)
        } else {
            self.0.source = Some(src);
        }
    }

    pub fn with_source(mut self, src: Self) -> Self {
        self.set_source(src);
        self
    }

    /// Display the error, along with its source if any.
    pub fn to_string_with_src(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let mut e = self;
        loop {
            write!(&mut s, "{}", e).unwrap();
            if let Some(src) = &e.0.source {
                write!(&mut s, "\nin ").unwrap();
                e = src;
            } else {
                break;
            }
        }
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_size() {
        // errors should be relatively small (one pointer here)
        assert!(std::mem::size_of::<Error>() <= 8);
    }

    #[test]
    fn test_send() {
        let _: &dyn Send = &Error::new("foo");
    }

    #[test]
    fn test_kinds() {
        assert!(Error::no_apply("nope").is_recoverable());
        assert!(Error::exhausted(50).is_recoverable());
        assert!(!Error::new("bad").is_recoverable());
        assert_eq!(Error::exhausted(50).kind(), ErrorKind::SearchExhausted(50));
    }
}
