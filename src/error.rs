use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use rand_distr::NormalError;
use safetensors::SafeTensorError;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, ZooErr>;

/// The model zoo's error type.
#[derive(Debug)]
pub enum ZooErr {
    UnknownModel {
        name: String,
        available: Vec<&'static str>,
    },
    InvalidNumClasses,
    UnsupportedLoss {
        loss: String,
    },
    LossNotSupported {
        model: &'static str,
        loss: &'static str,
    },
    MissingCheckpoint {
        model: &'static str,
        path: PathBuf,
        url: &'static str,
    },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyInput,
    BatchTooSmall {
        got: usize,
    },
    Config(String),
    Io(io::Error),
    Checkpoint(SafeTensorError),
    Shape(ndarray::ShapeError),
    Json(serde_json::Error),
    Init(NormalError),
}

impl Display for ZooErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZooErr::UnknownModel { name, available } => {
                write!(f, "Unknown model: {name}. Must be one of {available:?}")
            }
            ZooErr::InvalidNumClasses => {
                write!(f, "The number of classes must be a positive integer")
            }
            ZooErr::UnsupportedLoss { loss } => {
                write!(f, "Unsupported loss: {loss}. Must be one of [\"softmax\", \"triplet\"]")
            }
            ZooErr::LossNotSupported { model, loss } => {
                write!(f, "The model {model} can't be trained with the {loss} loss")
            }
            ZooErr::MissingCheckpoint { model, path, url } => write!(
                f,
                "No pretrained checkpoint for {model} at {}, download it from {url} and convert it to safetensors",
                path.display()
            ),
            ZooErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            ZooErr::EmptyInput => write!(f, "The input batch has no elements"),
            ZooErr::BatchTooSmall { got } => write!(
                f,
                "Batch normalization needs more than one sample per batch in training mode, got {got}"
            ),
            ZooErr::Config(msg) => write!(f, "invalid config: {msg}"),
            ZooErr::Io(e) => write!(f, "io error: {e}"),
            ZooErr::Checkpoint(e) => write!(f, "checkpoint error: {e}"),
            ZooErr::Shape(e) => write!(f, "shape error: {e}"),
            ZooErr::Json(e) => write!(f, "json error: {e}"),
            ZooErr::Init(e) => write!(f, "failed to initialize parameters: {e}"),
        }
    }
}

impl Error for ZooErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ZooErr::Io(e) => Some(e),
            ZooErr::Checkpoint(e) => Some(e),
            ZooErr::Shape(e) => Some(e),
            ZooErr::Json(e) => Some(e),
            ZooErr::Init(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ZooErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SafeTensorError> for ZooErr {
    fn from(value: SafeTensorError) -> Self {
        Self::Checkpoint(value)
    }
}

impl From<ndarray::ShapeError> for ZooErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<NormalError> for ZooErr {
    fn from(value: NormalError) -> Self {
        Self::Init(value)
    }
}

impl From<serde_json::Error> for ZooErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_model_message_lists_every_name() {
        let err = ZooErr::UnknownModel {
            name: "not_a_model".into(),
            available: vec!["resnet50", "hacnn"],
        };

        let msg = err.to_string();
        assert!(msg.contains("not_a_model"));
        assert!(msg.contains("\"resnet50\""));
        assert!(msg.contains("\"hacnn\""));
    }
}
