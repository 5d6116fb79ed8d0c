//! Typed errors for scene construction, uniform updates and navigation.
//!
//! Asset I/O keeps using `anyhow` the way the loaders always did; everything a
//! caller can get wrong at runtime is a [`SceneError`].

pub type SceneResult<T> = Result<T, SceneError>;

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("scene has been disposed")]
    Disposed,

    #[error("unknown uniform `{0}`")]
    UnknownUniform(String),

    #[error("uniform `{name}` holds a {expected}, got a {actual}")]
    UniformTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("morph index {index} is out of range for {len} position sets")]
    MorphIndexOutOfRange { index: usize, len: usize },

    #[error("a transition to `{0}` is already in flight")]
    TransitionInFlight(String),

    #[error("unknown route `{0}`")]
    UnknownRoute(String),

    #[error("invalid colour `{0}`")]
    InvalidColour(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    pub fn type_mismatch(name: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self::UniformTypeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }
}
