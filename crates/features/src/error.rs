/// Errors raised while building or transforming feature tables.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// A nonzero or candidate references a row/column that does not exist.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A transform was given a table of the wrong width.
    #[error("feature width mismatch: expected {expected}, found {found}")]
    WidthMismatch { expected: usize, found: usize },

    /// A scale entry would divide by zero or propagate non-finite values.
    #[error("invalid scale value {value} at feature {index}")]
    InvalidScale { index: usize, value: f64 },

    /// Shift and scale vectors disagree in length.
    #[error("shift has {shift} entries but scale has {scale}")]
    ScalingLength { shift: usize, scale: usize },

    /// Table concatenation failed.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
