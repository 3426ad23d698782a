/// Errors produced by the geometric primitives.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum TransformError {
    /// The 3×3 point matrix is singular: the control points are colinear or coincident.
    #[error("no solution: control points are colinear or coincident (det={det:e})")]
    NoSolution { det: f64 },
    /// The affine transform cannot be inverted.
    #[error("transform is not invertible (det={det:e})")]
    Noninvertible { det: f64 },
}
