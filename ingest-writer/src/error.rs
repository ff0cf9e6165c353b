use std::error::Error;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type BoxError = Box<dyn Error + Send + Sync + 'static>;
type SharedError = Arc<dyn Error + Send + Sync + 'static>;

macro_rules! collaborator_error {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, thiserror::Error)]
        #[error(transparent)]
        pub struct $name(SharedError);

        impl $name {
            /// Wraps an error or message reported by the collaborator.
            pub fn new(error: impl Into<BoxError>) -> Self {
                Self(Arc::from(error.into()))
            }
        }
    };
}

collaborator_error!(
    /// The downsampler rejected an appender, tag or sample.
    AppenderError
);

collaborator_error!(
    /// A single storage write failed.
    StorageError
);

collaborator_error!(
    /// A batch iterator could not be rewound or stopped with an error.
    IterError
);

/// An error returned by [`DownsamplerAndWriter`](crate::DownsamplerAndWriter).
///
/// [`Appender`](Self::Appender), [`Storage`](Self::Storage) and [`Iterator`](Self::Iterator) are
/// returned when a single failure ended the call. [`Partial`](Self::Partial) is returned once all
/// parallel writes of a call completed and at least one of them failed.
#[derive(Clone, Debug, thiserror::Error)]
pub enum WriteError {
    /// Writing to the downsampler failed.
    #[error("failed to append to the downsampler")]
    Appender(#[from] AppenderError),
    /// Writing to storage failed.
    #[error("failed to write to storage")]
    Storage(#[from] StorageError),
    /// The batch iterator failed.
    #[error("failed to iterate the batch")]
    Iterator(#[from] IterError),
    /// Some of the writes of a call failed.
    #[error(transparent)]
    Partial(#[from] MultiError),
}

impl WriteError {
    /// Returns `true` if the call completed and only some of its writes failed.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial(_))
    }
}

/// The errors collected from the writes of one call, in the order they were reported.
///
/// The error never holds an empty list.
#[derive(Clone, Debug)]
pub struct MultiError {
    errors: Vec<WriteError>,
}

impl MultiError {
    /// Returns the error that was reported last.
    pub fn last(&self) -> &WriteError {
        // The collector never creates an empty instance.
        &self.errors[self.errors.len() - 1]
    }

    /// Returns all collected errors.
    pub fn errors(&self) -> &[WriteError] {
        &self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "1 write failed"),
            n => write!(f, "{n} writes failed"),
        }
    }
}

impl Error for MultiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.last())
    }
}

/// Collects errors from concurrently running writes.
///
/// The collector is shared between tasks through an `Arc`. Every contribution is serialized by
/// a lock. [`finish`](Self::finish) must only be called after all contributing tasks completed.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Mutex<Vec<WriteError>>,
}

impl ErrorCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error.
    pub fn add(&self, error: impl Into<WriteError>) {
        self.errors.lock().push(error.into());
    }

    /// Returns the number of errors recorded so far.
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    /// Returns `true` if no errors were recorded so far.
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Drains the collected errors.
    pub fn finish(&self) -> Result<(), MultiError> {
        let errors = std::mem::take(&mut *self.errors.lock());
        match errors.is_empty() {
            true => Ok(()),
            false => Err(MultiError { errors }),
        }
    }
}
